use std::hint::black_box;
use std::path::PathBuf;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mcstat::results::{AggregatedRow, AggregatedTable, RunRecord};
use mcstat::stats::StatSummary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const METRICS: [&str; 4] = ["train loss", "test loss", "train accuracy", "test accuracy"];
const NETWORKS: [&str; 2] = ["complex_net", "real_net"];
const STEPS: u64 = 100;

fn synthetic_table(runs: usize) -> AggregatedTable {
    let mut rng = StdRng::seed_from_u64(7);
    let mut rows = Vec::with_capacity(runs * NETWORKS.len() * STEPS as usize);
    for run in 0..runs {
        for network in NETWORKS {
            for step in 0..STEPS {
                let values = (0..METRICS.len())
                    .map(|_| rng.random_bool(0.99).then(|| rng.random::<f64>()))
                    .collect();
                rows.push(AggregatedRow {
                    run: format!("run {run}"),
                    path: PathBuf::from(format!("run_{run}_results_fit.csv")),
                    record: RunRecord {
                        network: network.to_string(),
                        step,
                        values,
                    },
                });
            }
        }
    }
    AggregatedTable::from_rows(METRICS.iter().map(|metric| metric.to_string()).collect(), rows)
}

fn bench_summary(c: &mut Criterion) {
    let tracked: Vec<String> = METRICS.iter().map(|metric| metric.to_string()).collect();
    for runs in [10, 100] {
        let table = synthetic_table(runs);
        c.bench_with_input(BenchmarkId::new("stat_summary", runs), &table, |b, table| {
            b.iter(|| StatSummary::compute(black_box(table), &tracked));
        });
    }
}

criterion_group!(benches, bench_summary);
criterion_main!(benches);
