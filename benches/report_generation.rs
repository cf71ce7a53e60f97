use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use plantation_report::analysis::{Domain, Resolver};
use plantation_report::{EngineConfig, ReportEngine, ReportRequest};

fn sample_analysis(ph: f64) -> Value {
    json!({
        "executive_summary": "Benchmark analysis",
        "raw_data": {
            "soil_parameters": {"parameter_statistics": {
                "pH": {"average": ph},
                "N (%)": {"average": 0.11},
                "Avail P (mg/kg)": {"average": "18"},
                "Exch. K (meq%)": {"average": 0.14},
                "Exch. Mg (meq%)": {"average": 0.30},
                "CEC (meq%)": {"average": 7.2}
            }},
            "leaf_parameters": {"parameter_statistics": {
                "N (%)": {"average": 2.3},
                "P (%)": {"average": 0.14},
                "K (%)": {"average": 0.85},
                "Mg (%)": {"average": 0.22},
                "B (mg/kg)": {"average": "N.D."}
            }}
        },
        "step_by_step_analysis": [{"step_title": "Soil", "summary": "Acidic"}],
        "current_yield": 21.5,
        "yield_forecast": {
            "high_investment": ["23-24", "25-27", "27-29", "28-30", "29-31"],
            "low_investment": [21.8, 22.0, 22.3, 22.5, 22.8]
        }
    })
}

fn bench_resolve(c: &mut Criterion) {
    let resolver = Resolver::new();
    let doc = sample_analysis(4.2);
    c.bench_function("resolve_soil_domain", |b| {
        b.iter(|| resolver.resolve_domain(black_box(&doc), Domain::Soil))
    });
}

fn bench_generate(c: &mut Criterion) {
    let engine = ReportEngine::new(EngineConfig::default());
    let request = ReportRequest::new(sample_analysis(4.2));
    c.bench_function("generate_report", |b| b.iter(|| engine.generate(black_box(&request))));

    let batch: Vec<ReportRequest> = (0..64)
        .map(|i| ReportRequest::new(sample_analysis(4.0 + (i % 10) as f64 * 0.1)))
        .collect();
    c.bench_function("generate_batch_64", |b| b.iter(|| engine.generate_batch(black_box(&batch))));
}

criterion_group!(benches, bench_resolve, bench_generate);
criterion_main!(benches);
