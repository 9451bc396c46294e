use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use simplebroker::{QueueManager, QueueManagerConfig};
use tokio_util::sync::CancellationToken;

fn config(max_messages_per_queue: usize) -> QueueManagerConfig {
    QueueManagerConfig {
        max_queue_num: 16,
        max_messages_per_queue,
    }
}

fn bench_put_then_get(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("put_then_get");

    for &batch in [100usize, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("sequential", batch), &batch, |b, &batch| {
            let manager = QueueManager::new(config(batch));
            let manager = &manager;
            let never = CancellationToken::new();
            let never = &never;

            b.to_async(&rt).iter(|| async move {
                for i in 0..batch {
                    manager.put("bench", format!("m{i}")).await.unwrap();
                }
                for _ in 0..batch {
                    let got = manager
                        .get(never, "bench", Duration::from_secs(1))
                        .await
                        .unwrap();
                    black_box(got);
                }
            });
        });
    }

    group.finish();
}

fn bench_handoff_to_waiting_consumers(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("handoff");

    for &consumers in [1usize, 4, 16].iter() {
        const PER_CONSUMER: usize = 250;
        group.throughput(Throughput::Elements((consumers * PER_CONSUMER) as u64));
        group.bench_with_input(
            BenchmarkId::new("waiting_consumers", consumers),
            &consumers,
            |b, &consumers| {
                let manager = Arc::new(QueueManager::new(config(consumers * PER_CONSUMER)));

                b.to_async(&rt).iter(|| {
                    let manager = Arc::clone(&manager);
                    async move {
                        // Make sure the queue exists so consumers block instead of bailing.
                        manager.put("handoff", String::new()).await.unwrap();
                        let never = CancellationToken::new();
                        manager
                            .get(&never, "handoff", Duration::from_secs(1))
                            .await
                            .unwrap();

                        let mut handles = Vec::with_capacity(consumers);
                        for _ in 0..consumers {
                            let manager = Arc::clone(&manager);
                            handles.push(tokio::spawn(async move {
                                let never = CancellationToken::new();
                                for _ in 0..PER_CONSUMER {
                                    let got = manager
                                        .get(&never, "handoff", Duration::from_secs(5))
                                        .await
                                        .unwrap();
                                    black_box(got);
                                }
                            }));
                        }
                        for i in 0..consumers * PER_CONSUMER {
                            manager.put("handoff", format!("m{i}")).await.unwrap();
                        }
                        for handle in handles {
                            handle.await.unwrap();
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_put_then_get, bench_handoff_to_waiting_consumers);
criterion_main!(benches);
