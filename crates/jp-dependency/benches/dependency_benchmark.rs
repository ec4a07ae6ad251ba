use criterion::{Criterion, criterion_group, criterion_main};
use jp_dependency::{
    CorrelationMatrix, Dependence, Indicator, InclusionExclusionConfig, exclusive_with_config, pcm_joint_probability,
    union_with_config,
};
use std::hint::black_box;

fn bench_pcm(c: &mut Criterion) {
    let p: Vec<f64> = (0..10).map(|i| 0.01 + 0.004 * i as f64).collect();
    let r = CorrelationMatrix::equicorrelated(10, 0.3).unwrap();
    let all = Indicator::all(10).unwrap();
    c.bench_function("pcm_joint_probability_n10", |b| {
        b.iter(|| black_box(pcm_joint_probability(black_box(&p), all, &r)))
    });
}

fn bench_inclusion_exclusion(c: &mut Criterion) {
    let p: Vec<f64> = (0..10).map(|i| 0.01 + 0.004 * i as f64).collect();
    let dep = Dependence::Correlated(CorrelationMatrix::equicorrelated(10, 0.1).unwrap());

    for (name, config) in
        [("early_exit", InclusionExclusionConfig::default()), ("full", InclusionExclusionConfig::full())]
    {
        c.bench_function(&format!("union_pcm_n10_{}", name), |b| {
            b.iter(|| black_box(union_with_config(black_box(&p), &dep, &config).unwrap()))
        });
        c.bench_function(&format!("exclusive_pcm_n10_{}", name), |b| {
            b.iter(|| black_box(exclusive_with_config(black_box(&p), &dep, &config).unwrap()))
        });
    }
}

criterion_group!(benches, bench_pcm, bench_inclusion_exclusion);
criterion_main!(benches);
