//! # Equipment Lending Benchmarks
//!
//! | Path                         | What it measures                          |
//! |------------------------------|-------------------------------------------|
//! | `create_to_approved`         | directory lookups + two ledger commits    |
//! | `contended_acceptances/N`    | N co-responsibles racing on one order lock |

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use el_02_authorization_engine::AuthorizationApi;
use el_05_notification_dispatcher::RecordingSink;
use el_tests::integration::fixtures::{coresponsible, p, request, roster, test_config, BORROWER, INSTRUCTOR};
use lending_runtime::container::LendingServices;
use shared_types::entities::{OrderKind, Verdict};

fn services() -> Arc<LendingServices<RecordingSink>> {
    Arc::new(LendingServices::new(
        test_config(),
        &roster(),
        Arc::new(RecordingSink::new()),
    ))
}

fn bench_create_to_approved(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let services = services();

    c.bench_function("create_to_approved", |b| {
        b.to_async(&rt).iter(|| {
            let auth = services.authorization.clone();
            async move {
                let order = auth
                    .create_order(request(BORROWER, &[], OrderKind::Ordinary))
                    .await
                    .unwrap();
                auth.decide_authorization(order.id, &p(INSTRUCTOR), Verdict::Accept)
                    .await
                    .unwrap();
            }
        });
    });
}

fn bench_contended_acceptances(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let services = services();
    let mut group = c.benchmark_group("contended_acceptances");

    for signers in [2usize, 8, 16] {
        let names: Vec<&'static str> = (1..=signers).map(coresponsible).collect();
        group.throughput(Throughput::Elements(signers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(signers), &names, |b, names| {
            b.to_async(&rt).iter(|| {
                let auth = services.authorization.clone();
                let names = names.clone();
                async move {
                    let order = auth
                        .create_order(request(BORROWER, &names, OrderKind::Ordinary))
                        .await
                        .unwrap();
                    let tasks = names.into_iter().map(|name| {
                        let auth = auth.clone();
                        tokio::spawn(async move {
                            auth.decide_coresponsible(order.id, &p(name), Verdict::Accept)
                                .await
                        })
                    });
                    for result in futures::future::join_all(tasks).await {
                        result.unwrap().unwrap();
                    }
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_create_to_approved, bench_contended_acceptances);
criterion_main!(benches);
