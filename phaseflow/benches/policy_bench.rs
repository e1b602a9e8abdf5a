//! Benchmarks for the retry policy engine and request fingerprinting.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phaseflow::core::StepCategory;
use phaseflow::errors::{ErrorClass, StepError};
use phaseflow::policy::{RetryPolicy, TimeoutRegistry};
use phaseflow::steps::StepRequest;
use phaseflow::utils::fingerprint;

fn policy_benchmark(c: &mut Criterion) {
    let registry = TimeoutRegistry::default();
    c.bench_function("decide_long_tier", |b| {
        b.iter(|| {
            for attempt in 1..=5 {
                black_box(registry.decide(
                    StepCategory::Long,
                    black_box(attempt),
                    ErrorClass::Retryable,
                ));
            }
        });
    });

    let policy = RetryPolicy::short();
    let error = StepError::rate_limited("slow down");
    c.bench_function("classify", |b| {
        b.iter(|| black_box(policy.classify(black_box(&error))));
    });
}

fn fingerprint_benchmark(c: &mut Criterion) {
    let request = StepRequest::SearchTrials {
        drug_name: "FLUOROURACIL".to_string(),
        condition: "cancer".to_string(),
    };
    c.bench_function("fingerprint_request", |b| {
        b.iter(|| black_box(fingerprint(black_box(&request))));
    });
}

criterion_group!(benches, policy_benchmark, fingerprint_benchmark);
criterion_main!(benches);
