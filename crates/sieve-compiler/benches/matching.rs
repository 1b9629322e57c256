use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sieve_compiler::build_request_filter;
use sieve_core::{FilterConfig, RequestContext, RequestType};

fn generated_list(count: usize) -> String {
    let mut list = String::new();
    for i in 0..count {
        match i % 4 {
            0 => list.push_str(&format!("||ads{i}.example.net^\n")),
            1 => list.push_str(&format!("||cdn.example.com/banner{i}/*$script,third-party\n")),
            2 => list.push_str(&format!("site{i}.com##.promo-{i}\n")),
            _ => list.push_str(&format!("@@||ads{}.example.net/ok.js\n", i - 3)),
        }
    }
    list
}

fn bench_match_request(c: &mut Criterion) {
    let list = generated_list(20_000);
    // The cache would turn every iteration after the first into a lookup
    let config = FilterConfig { request_cache_size: 0 };
    let (filter, _) = build_request_filter([(1, list.as_str())], config);

    let urls = [
        "https://ads400.example.net/track.js",
        "https://cdn.example.com/banner401/x.js",
        "https://ads0.example.net/ok.js",
        "https://www.unrelated.org/app.js",
    ];

    c.bench_function("match_request", |b| {
        b.iter(|| {
            for url in &urls {
                let ctx = RequestContext::new(url, Some("https://site.com/"), RequestType::SCRIPT);
                black_box(filter.match_request(&ctx).decision);
            }
        })
    });

    c.bench_function("cosmetic_result", |b| {
        b.iter(|| black_box(filter.cosmetic_result("https://site402.com/")))
    });
}

fn bench_parse(c: &mut Criterion) {
    let list = generated_list(20_000);
    c.bench_function("parse_filter_list", |b| {
        b.iter(|| {
            black_box(sieve_compiler::parse_filter_list(
                &list,
                &sieve_compiler::ParseOptions { filter_id: 1 },
            ))
        })
    });
}

criterion_group!(benches, bench_match_request, bench_parse);
criterion_main!(benches);
