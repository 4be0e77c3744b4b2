//! # VIP IPAM Allocation Benchmarks
//!
//! | Path | Cost driver |
//! |------|-------------|
//! | `allocate` over a CIDR block | number of claimed addresses below the first free one |
//! | `allocate` over a range | same, range bounds parsed per call |
//! | `resolve_pool` | up to four document lookups |
//! | full reconciliation | store round trips plus the above |

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::seq::SliceRandom;
use vip_ipam::{
    allocate, resolve_pool, ClaimSet, ConfigurationSnapshot, InMemoryConfigStore,
    InMemoryRequestStore, IpamConfig, PoolDefinition, ReconciliationCoordinator, ServiceRequest,
    LABEL_IMPLEMENTATION, LABEL_IPAM_ADDRESS,
};

// ============================================================================
// FIXTURES
// ============================================================================

/// Claims covering the first `n` usable addresses of 10.0.0.0/16, shuffled.
fn dense_claims(n: u32) -> ClaimSet {
    let mut addrs: Vec<IpAddr> = (1..=n)
        .map(|i| IpAddr::V4(Ipv4Addr::from(u32::from(Ipv4Addr::new(10, 0, 0, 0)) + i)))
        .collect();
    addrs.shuffle(&mut rand::thread_rng());
    addrs.into_iter().collect()
}

// ============================================================================
// ALLOCATOR
// ============================================================================

fn bench_allocate_cidr(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate-cidr");
    let pool = PoolDefinition::cidr("10.0.0.0/16");

    for claimed in [0u32, 100, 1_000, 10_000] {
        let claims = dense_claims(claimed);
        group.throughput(Throughput::Elements(u64::from(claimed) + 1));
        group.bench_with_input(BenchmarkId::new("first_free", claimed), &claims, |b, claims| {
            b.iter(|| black_box(allocate(&pool, claims)))
        });
    }
    group.finish();
}

fn bench_allocate_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate-range");
    let pool = PoolDefinition::range("10.0.0.1", "10.0.255.254");

    for claimed in [0u32, 1_000] {
        let claims = dense_claims(claimed);
        group.bench_with_input(BenchmarkId::new("first_free", claimed), &claims, |b, claims| {
            b.iter(|| black_box(allocate(&pool, claims)))
        });
    }
    group.finish();
}

fn bench_resolve_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve-pool");

    let namespaced: ConfigurationSnapshot = [("cidr-prod", "10.1.0.0/24")].into_iter().collect();
    group.bench_function("namespace_hit", |b| {
        b.iter(|| black_box(resolve_pool("prod", &namespaced)))
    });

    let fallback: ConfigurationSnapshot =
        [("range-global", "10.2.0.1-10.2.0.254")].into_iter().collect();
    group.bench_function("global_range_fallback", |b| {
        b.iter(|| black_box(resolve_pool("prod", &fallback)))
    });
    group.finish();
}

// ============================================================================
// RECONCILIATION
// ============================================================================

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    group.measurement_time(Duration::from_secs(5));

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => panic!("failed to build runtime: {e}"),
    };

    for owned in [10usize, 500] {
        let config = IpamConfig::new();
        let requests = Arc::new(InMemoryRequestStore::new());
        for i in 0..owned {
            requests.insert(
                ServiceRequest::new("bench", format!("bound-{i}"))
                    .with_label(LABEL_IMPLEMENTATION, &config.allocator_id)
                    .with_label(LABEL_IPAM_ADDRESS, format!("10.9.{}.{}", i / 250, i % 250 + 1))
                    .with_assigned_address(format!("10.9.{}.{}", i / 250, i % 250 + 1)),
            );
        }
        let snapshot: ConfigurationSnapshot = [("cidr-bench", "10.9.0.0/16")].into_iter().collect();
        let configs = Arc::new(InMemoryConfigStore::with_document(
            &config.config_document.name,
            &config.config_document.namespace,
            snapshot,
        ));
        let coordinator = ReconciliationCoordinator::new(requests.clone(), configs, config);

        group.bench_with_input(BenchmarkId::new("bind_new_request", owned), &owned, |b, _| {
            b.iter(|| {
                let request = requests.insert(ServiceRequest::new("bench", "fresh"));
                let outcome = runtime.block_on(
                    coordinator.sync_load_balancer(&request, coordinator.cancellation()),
                );
                requests.remove("bench", "fresh");
                black_box(outcome)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_allocate_cidr,
    bench_allocate_range,
    bench_resolve_pool,
    bench_reconcile,
);
criterion_main!(benches);
