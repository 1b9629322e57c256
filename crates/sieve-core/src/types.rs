//! Core type definitions for rulesieve
//!
//! Bit flags and request/response types shared by the rule model,
//! the lookup tables and the request filter.

use crate::network::NetworkRule;
use crate::psl::is_third_party;
use crate::url::extract_host;

// =============================================================================
// Request Types (bit mask for content type filtering)
// =============================================================================

bitflags::bitflags! {
    /// Request content type bit mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequestType: u32 {
        const OTHER = 1 << 0;
        const SCRIPT = 1 << 1;
        const IMAGE = 1 << 2;
        const STYLESHEET = 1 << 3;
        const OBJECT = 1 << 4;
        const SUBDOCUMENT = 1 << 5;  // iframe/frame
        const XMLHTTPREQUEST = 1 << 6;
        const OBJECT_SUBREQUEST = 1 << 7;
        const MEDIA = 1 << 8;
        const FONT = 1 << 9;
        const WEBSOCKET = 1 << 10;
        const WEBRTC = 1 << 11;
        const DOCUMENT = 1 << 12;    // main document
        const POPUP = 1 << 13;

        /// All request types
        const ALL = (1 << 14) - 1;
    }
}

impl RequestType {
    /// Parse from a filter option name (`script`, `xmlhttprequest`, ...).
    ///
    /// Names are expected in lower case.
    pub fn from_option_name(name: &str) -> Option<Self> {
        match name {
            "other" => Some(Self::OTHER),
            "script" => Some(Self::SCRIPT),
            "image" => Some(Self::IMAGE),
            "stylesheet" => Some(Self::STYLESHEET),
            "object" => Some(Self::OBJECT),
            "subdocument" => Some(Self::SUBDOCUMENT),
            "xmlhttprequest" => Some(Self::XMLHTTPREQUEST),
            "object-subrequest" => Some(Self::OBJECT_SUBREQUEST),
            "media" => Some(Self::MEDIA),
            "font" => Some(Self::FONT),
            "websocket" => Some(Self::WEBSOCKET),
            "webrtc" => Some(Self::WEBRTC),
            "document" => Some(Self::DOCUMENT),
            "popup" => Some(Self::POPUP),
            _ => None,
        }
    }

    /// Parse from a browser request type string.
    pub fn from_request_name(s: &str) -> Self {
        match s {
            "main_frame" | "document" => Self::DOCUMENT,
            "sub_frame" | "subdocument" => Self::SUBDOCUMENT,
            "stylesheet" => Self::STYLESHEET,
            "script" => Self::SCRIPT,
            "image" => Self::IMAGE,
            "font" => Self::FONT,
            "object" => Self::OBJECT,
            "object_subrequest" | "object-subrequest" => Self::OBJECT_SUBREQUEST,
            "xmlhttprequest" | "xhr" => Self::XMLHTTPREQUEST,
            "media" => Self::MEDIA,
            "websocket" => Self::WEBSOCKET,
            "webrtc" => Self::WEBRTC,
            "popup" => Self::POPUP,
            _ => Self::OTHER,
        }
    }
}

// =============================================================================
// Party Masks
// =============================================================================

bitflags::bitflags! {
    /// Party (first-party / third-party) mask. Empty means "any party".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PartyMask: u8 {
        /// $~third-party
        const FIRST_PARTY = 1 << 0;
        /// $third-party
        const THIRD_PARTY = 1 << 1;
    }
}

// =============================================================================
// Network Rule Options
// =============================================================================

bitflags::bitflags! {
    /// Behavioral options of a network rule.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NetworkOptions: u16 {
        /// Exception: disables element hiding on the document
        const ELEMHIDE = 1 << 0;
        /// Exception: disables generic element hiding on the document
        const GENERICHIDE = 1 << 1;
        /// Exception: disables JS and scriptlet injection on the document
        const JSINJECT = 1 << 2;
        /// Exception: disables every URL blocking rule for requests from the document
        const URLBLOCK = 1 << 3;
        /// Exception: disables generic URL blocking rules for the document
        const GENERICBLOCK = 1 << 4;
        /// Exception: disables content (HTML filtering) rules on the document
        const CONTENT = 1 << 5;
        /// $popup
        const BLOCK_POPUPS = 1 << 6;
        /// $empty - respond with an empty body instead of cancelling
        const EMPTY_RESPONSE = 1 << 7;
        /// $match-case
        const MATCH_CASE = 1 << 8;
        /// $important - wins over regular exceptions
        const IMPORTANT = 1 << 9;
        /// $csp=...
        const CSP_RULE = 1 << 10;

        /// $document on an exception rule
        const DOCUMENT_WHITELIST = Self::ELEMHIDE.bits()
            | Self::URLBLOCK.bits()
            | Self::JSINJECT.bits()
            | Self::CONTENT.bits();
        /// Options that only make sense on exception rules
        const WHITELIST_ONLY = Self::ELEMHIDE.bits()
            | Self::GENERICHIDE.bits()
            | Self::JSINJECT.bits()
            | Self::URLBLOCK.bits()
            | Self::GENERICBLOCK.bits()
            | Self::CONTENT.bits();
        /// Options that restrict a rule to documents
        const DOCUMENT_LEVEL = Self::WHITELIST_ONLY.bits();
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Context for a request being matched.
///
/// The derived fields (document host, third-party flag) are computed once in
/// [`RequestContext::new`] so they always agree with the URLs.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    url: &'a str,
    document_url: Option<&'a str>,
    /// Lower-cased host of the document URL
    document_host: Option<String>,
    is_third_party: bool,
    request_type: RequestType,
}

impl<'a> RequestContext<'a> {
    /// Build a context, deriving the document host and the third-party flag.
    pub fn new(url: &'a str, document_url: Option<&'a str>, request_type: RequestType) -> Self {
        let document_host = document_url
            .and_then(extract_host)
            .map(str::to_ascii_lowercase);
        let is_third_party = match (extract_host(url), document_host.as_deref()) {
            (Some(req_host), Some(doc_host)) => is_third_party(doc_host, &req_host.to_ascii_lowercase()),
            _ => false,
        };

        Self {
            url,
            document_url,
            document_host,
            is_third_party,
            request_type,
        }
    }

    /// Full request URL
    pub fn url(&self) -> &'a str {
        self.url
    }

    /// URL of the document that initiated the request
    pub fn document_url(&self) -> Option<&'a str> {
        self.document_url
    }

    pub fn document_host(&self) -> Option<&str> {
        self.document_host.as_deref()
    }

    pub fn is_third_party(&self) -> bool {
        self.is_third_party
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }
}

// =============================================================================
// Match Result
// =============================================================================

/// Final decision for a matched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MatchDecision {
    /// Request is blocked
    Block,
    /// Request is explicitly allowed by an exception rule
    Allow,
    /// No rule applies; callers let the request through
    #[cfg_attr(feature = "serde", serde(rename = "none"))]
    NoMatch,
}

/// Result of matching a request.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    /// The final decision for this request
    pub decision: MatchDecision,
    /// Rule that determined the decision
    pub rule: Option<&'a NetworkRule>,
}

impl MatchResult<'_> {
    /// Is the request blocked?
    pub fn is_blocked(&self) -> bool {
        self.decision == MatchDecision::Block
    }
}

impl Default for MatchResult<'_> {
    fn default() -> Self {
        Self {
            decision: MatchDecision::NoMatch,
            rule: None,
        }
    }
}
