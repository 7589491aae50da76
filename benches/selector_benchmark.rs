use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use serde_json::{json, Value};
use travel_planner::offers::select_cheapest;

// Build a search response with `count` offers, roughly one in ten unpriced
fn search_response(count: usize) -> Value {
    let mut rng = rand::thread_rng();
    let offers: Vec<Value> = (0..count)
        .map(|i| {
            let legs = json!([{
                "airline": format!("Airline {}", i % 7),
                "departure_airport": {"id": "BOM", "time": "2025-06-11 08:15"},
                "arrival_airport": {"id": "DEL", "time": "2025-06-11 10:25"}
            }]);
            if rng.gen_bool(0.1) {
                json!({"flights": legs, "total_duration": 130})
            } else {
                json!({
                    "price": rng.gen_range(2_000..40_000),
                    "flights": legs,
                    "total_duration": 130
                })
            }
        })
        .collect();

    json!({
        "search_parameters": {"currency": "INR"},
        "best_flights": offers
    })
}

pub fn selector_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("cheapest_offer_selection");

    for count in [10, 100, 1000].iter() {
        let raw = search_response(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &raw, |b, raw| {
            b.iter(|| black_box(select_cheapest(black_box(raw))));
        });
    }

    group.finish();
}

criterion_group!(benches, selector_benchmark);
criterion_main!(benches);
