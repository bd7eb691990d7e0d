//! Benchmarks for the polling kernel hot paths.
//!
//! Covers:
//! - Trigger next-instant computation
//! - One no-transaction poll cycle (receive + dispatch + callbacks)
//! - An idle poll cycle against an empty source
//! - A full pseudo-transactional cycle (register + dispatch + commit)

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use tokio::runtime::Runtime;

use prometheus_poller::core::{
    PeriodicTrigger, PollingEndpoint, TransactionContext, TransactionStatus, Trigger,
    TriggerContext,
};
use prometheus_poller::infra::channel::memory::QueueChannel;
use prometheus_poller::infra::source::memory::InMemorySource;

fn bench_trigger(c: &mut Criterion) {
    let trigger = PeriodicTrigger::fixed_rate(Duration::from_millis(100));
    let ctx = TriggerContext::default();
    c.bench_function("trigger_next_execution", |b| {
        b.iter(|| black_box(trigger.next_execution(black_box(&ctx))));
    });
}

fn bench_poll_cycle(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("poll_cycle");
    group.throughput(Throughput::Elements(1));

    group.bench_function("no_tx_dispatch", |b| {
        let source = Arc::new(InMemorySource::new("bench"));
        let output = Arc::new(QueueChannel::new(1024));
        let endpoint = Arc::new(PollingEndpoint::new(Arc::clone(&source), Arc::clone(&output)));
        b.to_async(&rt).iter(|| {
            let source = Arc::clone(&source);
            let output = Arc::clone(&output);
            let endpoint = Arc::clone(&endpoint);
            async move {
                source.push("payload".to_string());
                let ctx = TransactionContext::none();
                let outcome = endpoint.poll(&ctx).await.unwrap();
                // Drain so the bounded channel never fills up.
                let _ = output.receive(Duration::from_millis(10)).await;
                black_box(outcome)
            }
        });
    });

    group.bench_function("idle_poll", |b| {
        let source = Arc::new(InMemorySource::<String>::new("bench"));
        let output = Arc::new(QueueChannel::new(16));
        let endpoint = Arc::new(PollingEndpoint::new(source, Arc::clone(&output)));
        b.to_async(&rt).iter(|| {
            let endpoint = Arc::clone(&endpoint);
            async move {
                let ctx = TransactionContext::none();
                black_box(endpoint.poll(&ctx).await.unwrap())
            }
        });
    });

    group.bench_function("pseudo_tx_commit", |b| {
        let source = Arc::new(InMemorySource::new("bench"));
        let output = Arc::new(QueueChannel::new(1024));
        let endpoint = Arc::new(PollingEndpoint::new(Arc::clone(&source), Arc::clone(&output)));
        b.to_async(&rt).iter(|| {
            let source = Arc::clone(&source);
            let output = Arc::clone(&output);
            let endpoint = Arc::clone(&endpoint);
            async move {
                source.push("payload".to_string());
                let ctx = TransactionContext::active();
                let outcome = endpoint.poll(&ctx).await.unwrap();
                ctx.complete(TransactionStatus::Committed).await;
                let _ = output.receive(Duration::from_millis(10)).await;
                black_box(outcome)
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_trigger, bench_poll_cycle);
criterion_main!(benches);
