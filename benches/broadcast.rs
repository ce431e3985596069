use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use station::{Listener, StateMap, Station};

fn counter_state(n: i64) -> StateMap {
    match json!({ "count": n }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn bench_set_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_state");

    for listeners in [0usize, 1, 16, 128] {
        let (station, writer) = Station::<StateMap>::new(counter_state(0));
        let hits = Arc::new(AtomicU64::new(0));
        for _ in 0..listeners {
            let hits = Arc::clone(&hits);
            station.subscribe(Listener::from_fn(move |_: Arc<StateMap>| {
                hits.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }));
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, _| {
                let mut n = 0;
                b.iter(|| {
                    n += 1;
                    writer.set_state(black_box(counter_state(n)));
                });
            },
        );
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let (station, _writer) = Station::<StateMap>::new(StateMap::new());
    for _ in 0..16 {
        station.subscribe_on_event("tick", Listener::from_fn(|_| Ok(())));
    }

    c.bench_function("dispatch_16_listeners", |b| {
        b.iter(|| station.dispatch("tick", black_box(json!({"seq": 1}))));
    });
}

criterion_group!(benches, bench_set_state, bench_dispatch);
criterion_main!(benches);
