use std::path::{Path, PathBuf};

pub const FIT_SUFFIX: &str = "_results_fit.csv";

/// Write a fit-result file with `network,step,<metric>` columns.
pub fn write_run_file(dir: &Path, name: &str, metric: &str, rows: &[(&str, u64, f64)]) -> PathBuf {
    std::fs::create_dir_all(dir).expect("create run dir");
    let mut text = format!("network,step,{metric}\n");
    for (network, step, value) in rows {
        text.push_str(&format!("{network},{step},{value}\n"));
    }
    let path = dir.join(format!("{name}{FIT_SUFFIX}"));
    std::fs::write(&path, text).expect("write run file");
    path
}

/// Two runs: network "A" in the first file, network "B" in the second.
pub fn write_two_networks(dir: &Path) {
    write_run_file(
        dir,
        "run_0",
        "accuracy",
        &[("A", 1, 0.5), ("A", 2, 0.6), ("A", 3, 0.7)],
    );
    write_run_file(
        dir,
        "run_1",
        "accuracy",
        &[("B", 1, 0.4), ("B", 2, 0.5), ("B", 3, 0.9)],
    );
}
