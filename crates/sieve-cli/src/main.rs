//! rulesieve CLI
//!
//! Load filter lists and query the request filter from the command line.

use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};
use scraper::Html;
use serde_json::json;

use sieve_compiler::{build_request_filter, parse_filter_list, ParseOptions};
use sieve_core::{FilterConfig, RequestContext, RequestFilter, RequestType};

#[derive(Parser)]
#[command(name = "sieve-cli")]
#[command(about = "rulesieve filter list tools")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse filter lists and report rule counts and rejected lines
    Check {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,
    },

    /// Decide a single network request
    Match {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Request URL
        #[arg(short, long)]
        url: String,

        /// Document URL the request originates from
        #[arg(short, long)]
        document: Option<String>,

        /// Request type (script, image, xmlhttprequest, main_frame, ...)
        #[arg(short = 't', long = "type", default_value = "other")]
        request_type: String,
    },

    /// Print the cosmetic result for a page
    Cosmetic {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Document URL
        #[arg(short, long)]
        url: String,
    },

    /// List elements of an HTML file removed by content rules
    Content {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Document URL
        #[arg(short, long)]
        url: String,

        /// HTML file to filter
        #[arg(long)]
        html: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Check { input } => cmd_check(&input),
        Commands::Match {
            input,
            url,
            document,
            request_type,
        } => cmd_match(&input, &url, document.as_deref(), &request_type),
        Commands::Cosmetic { input, url } => cmd_cosmetic(&input, &url),
        Commands::Content { input, url, html } => cmd_content(&input, &url, &html),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_lists(inputs: &[String]) -> Result<Vec<String>, String> {
    inputs
        .iter()
        .map(|path| fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e)))
        .collect()
}

fn load_filter(inputs: &[String]) -> Result<RequestFilter, String> {
    let contents = read_lists(inputs)?;
    let lists = contents
        .iter()
        .enumerate()
        .map(|(index, text)| (index as u32 + 1, text.as_str()));

    let (filter, errors) = build_request_filter(lists, FilterConfig::default());
    if !errors.is_empty() {
        log::warn!("{} lines rejected", errors.len());
    }
    Ok(filter)
}

fn print_json(value: &serde_json::Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to encode output: {}", e))?;
    println!("{text}");
    Ok(())
}

fn cmd_check(inputs: &[String]) -> Result<(), String> {
    let start = Instant::now();
    let contents = read_lists(inputs)?;
    let mut total_rules = 0usize;
    let mut total_errors = 0usize;

    for (index, (path, text)) in inputs.iter().zip(&contents).enumerate() {
        let list = parse_filter_list(text, &ParseOptions { filter_id: index as u32 + 1 });
        println!(
            "  [{}] {} - {} lines, {} rules, {} rejected",
            index + 1,
            Path::new(path).file_name().unwrap_or_default().to_string_lossy(),
            text.lines().count(),
            list.len(),
            list.errors.len()
        );
        for error in &list.errors {
            println!("      line {}: {} ({})", error.line, error.text, error.error);
        }
        total_rules += list.len();
        total_errors += list.errors.len();
    }

    println!("Checked {} filter lists", inputs.len());
    println!("  Rules:    {}", total_rules);
    println!("  Rejected: {}", total_errors);
    println!("  Time:     {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);

    Ok(())
}

fn cmd_match(inputs: &[String], url: &str, document: Option<&str>, request_type: &str) -> Result<(), String> {
    let filter = load_filter(inputs)?;
    let request_type = RequestType::from_request_name(request_type);
    let ctx = RequestContext::new(url, document, request_type);

    let result = filter.match_request(&ctx);
    let csp: Vec<&str> = filter
        .find_csp_rules(&ctx)
        .iter()
        .filter_map(|rule| rule.csp_directive.as_deref())
        .collect();

    print_json(&json!({
        "url": url,
        "document": document,
        "third_party": ctx.is_third_party(),
        "decision": result.decision,
        "rule": result.rule.map(|rule| rule.rule_text()),
        "filter_id": result.rule.map(|rule| rule.base.filter_id),
        "csp": csp,
    }))
}

fn cmd_cosmetic(inputs: &[String], url: &str) -> Result<(), String> {
    let filter = load_filter(inputs)?;
    let result = filter.cosmetic_result(url);
    let value = serde_json::to_value(&result).map_err(|e| format!("Failed to encode output: {}", e))?;
    print_json(&value)
}

fn cmd_content(inputs: &[String], url: &str, html: &str) -> Result<(), String> {
    let filter = load_filter(inputs)?;
    let source = fs::read_to_string(html).map_err(|e| format!("Failed to read '{}': {}", html, e))?;
    let doc = Html::parse_document(&source);

    let rules = filter.content_rules_for_url(url);
    let removed: Vec<String> = filter
        .matched_elements(&doc, &rules)
        .iter()
        .map(|element| element.html())
        .collect();

    print_json(&json!({
        "url": url,
        "rules": rules.iter().map(|rule| rule.base.rule_text.as_str()).collect::<Vec<_>>(),
        "removed": removed,
    }))
}
