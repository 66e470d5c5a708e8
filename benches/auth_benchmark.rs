use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kinderwacht_auth::config::Config;
use kinderwacht_auth::models::DeviceInfo;
use kinderwacht_auth::services::TokenService;

fn benchmark_token_service(c: &mut Criterion) {
    // Build the service once with the test signing keys
    let tokens = TokenService::new(&Config::default());
    let pair = tokens
        .issue_pair("bench-account")
        .expect("Failed to issue token pair");

    let mut group = c.benchmark_group("token_service");

    group.bench_function("issue_pair", |b| {
        b.iter(|| tokens.issue_pair(black_box("bench-account")))
    });

    group.bench_function("verify_access", |b| {
        b.iter(|| tokens.verify_access(black_box(&pair.access_token)))
    });

    group.bench_function("verify_refresh", |b| {
        b.iter(|| tokens.verify_refresh(black_box(&pair.refresh_token)))
    });

    group.finish();
}

fn benchmark_device_classifier(c: &mut Criterion) {
    // The gate classifies the user agent on every login
    let chrome_windows = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    let iphone_safari = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 \
                         Mobile/15E148 Safari/604.1";

    let mut group = c.benchmark_group("device_classifier");

    group.bench_function("chrome_windows", |b| {
        b.iter(|| DeviceInfo::from_user_agent(black_box(chrome_windows), black_box("203.0.113.9")))
    });

    group.bench_function("iphone_safari", |b| {
        b.iter(|| DeviceInfo::from_user_agent(black_box(iphone_safari), black_box("203.0.113.9")))
    });

    group.finish();
}

criterion_group!(benches, benchmark_token_service, benchmark_device_classifier);
criterion_main!(benches);
