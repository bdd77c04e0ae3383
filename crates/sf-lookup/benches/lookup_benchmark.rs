use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sf_lookup::{
    GlobalConfig, InputRange, ScaleFactorLookup, SfResults, SfVariation, TaggerConfig,
    WeightOptions, compute_weights,
};
use std::hint::black_box;

const PT_BREAKPOINTS: [u64; 6] = [250, 300, 400, 500, 700, 100000];

fn make_lookup() -> ScaleFactorLookup {
    let wps = [
        ("WP1", 0.0, 0.8),
        ("WP2", 0.8, 0.9),
        ("WP3", 0.9, 0.95),
        ("WP4", 0.95, 0.98),
        ("WP5", 0.98, 1.0),
    ];
    let config = GlobalConfig {
        tagger: TaggerConfig {
            wps: wps.iter().map(|&(n, lo, hi)| (n.to_string(), [lo, hi])).collect(),
        },
    };

    let mut results = serde_json::Map::new();
    for (i, (name, _, _)) in wps.iter().enumerate() {
        for w in PT_BREAKPOINTS.windows(2) {
            let c = 1.0 - 0.02 * i as f64;
            results.insert(
                format!("{name}_pt{}to{}", w[0], w[1]),
                serde_json::json!({"final": {"central": c, "high": 0.05, "low": 0.04}}),
            );
        }
    }
    let results: SfResults =
        serde_json::from_value(serde_json::Value::Object(results)).expect("valid results");
    ScaleFactorLookup::new(&config, &results).expect("valid lookup")
}

fn make_events(n: usize) -> (Vec<f64>, Vec<f64>) {
    // Deterministic pseudo-random fill.
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    let scores = (0..n).map(|_| next()).collect();
    let pts = (0..n).map(|_| 200.0 + 1000.0 * next()).collect();
    (scores, pts)
}

fn bench_get_sf(c: &mut Criterion) {
    let lookup = make_lookup();
    let mut group = c.benchmark_group("sf_lookup");

    for n in [1_000usize, 100_000, 1_000_000] {
        let (scores, pts) = make_events(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("get_sf_nominal", n), &n, |b, _| {
            b.iter(|| {
                black_box(
                    lookup.get_sf(black_box(&scores), black_box(&pts), SfVariation::Nominal),
                )
            })
        });

        let opts = WeightOptions {
            score_range: Some(InputRange::new(0.0, 1.0)),
            pt_range: Some(InputRange::new(250.0, 1000.0)),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("compute_weights", n), &n, |b, _| {
            b.iter(|| black_box(compute_weights(&lookup, &scores, &pts, black_box(&opts))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get_sf);
criterion_main!(benches);
