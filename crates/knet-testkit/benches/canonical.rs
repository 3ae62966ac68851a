use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

use knet_core::{canonicalize, sign_fragment, signable_payload, verify_fragment, Address, Domain, Uuid};
use knet_store::AddressCache;
use knet_testkit::fixtures::TestAgent;

fn nested(width: usize) -> Value {
    let items: Vec<Value> = (0..width)
        .map(|i| json!({ "z": i, "a": format!("item-{i}"), "m": { "y": [1, 2, 3], "b": null } }))
        .collect();
    json!({ "items": items, "name": "bench", "meta": { "k": true } })
}

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");
    for width in [4usize, 64, 512] {
        let value = nested(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &value, |b, value| {
            b.iter(|| canonicalize(black_box(value)));
        });
    }
    group.finish();
}

fn bench_fragment_signing(c: &mut Criterion) {
    let agent = TestAgent::with_seed([0x42; 32]);
    let fragment = agent.fragment("Water boils at 100C at sea level", Uuid::new_v4(), 0.9);
    let key = agent.keypair.public_key();

    c.bench_function("fragment_payload", |b| {
        b.iter(|| signable_payload(black_box(&fragment)));
    });
    c.bench_function("fragment_sign", |b| {
        b.iter(|| {
            let mut f = fragment.clone();
            sign_fragment(black_box(&mut f), &agent.keypair)
        });
    });
    c.bench_function("fragment_verify", |b| {
        b.iter(|| verify_fragment(black_box(&fragment), &key));
    });
}

fn bench_address_cache(c: &mut Criterion) {
    let ids: Vec<Uuid> = (0..2048u128).map(Uuid::from_u128).collect();

    c.bench_function("address_cache_put_evict_1k", |b| {
        b.iter(|| {
            let mut cache = AddressCache::new(1000);
            for id in &ids {
                cache.put(*id, Address::new("hub:8080", Domain::Fragment, *id));
            }
            black_box(cache.len())
        });
    });

    let mut warm = AddressCache::new(4096);
    for id in &ids {
        warm.put(*id, Address::local(Domain::Fragment, *id));
    }
    c.bench_function("address_cache_get_hit", |b| {
        b.iter(|| warm.get(black_box(&ids[1024])));
    });
}

criterion_group!(benches, bench_canonicalize, bench_fragment_signing, bench_address_cache);
criterion_main!(benches);
