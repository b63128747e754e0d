use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::{Describe, StatKind, StatsError, describe, mean};
use crate::results::{AggregatedTable, format_value, writer_at};

/// Describe vectors of one `(network, step)` group.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSummary {
    pub step: u64,
    /// Rows in the group, including rows with missing cells.
    pub rows: usize,
    /// One entry per summarized metric, aligned with [`StatSummary::metrics`].
    pub metrics: Vec<Describe>,
}

/// All step summaries of one network, in order of first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSummary {
    pub network: String,
    pub steps: Vec<StepSummary>,
}

impl NetworkSummary {
    pub fn step(&self, step: u64) -> Option<&StepSummary> {
        self.steps.iter().find(|summary| summary.step == step)
    }
}

/// Per-(network, step) statistics of an [`AggregatedTable`].
///
/// Each group summary is computed from the rows of exactly that group, so
/// rows for other networks or steps never change it. Incomplete data is kept
/// visible in [`missing`](Self::missing) and [`empty_groups`](Self::empty_groups).
#[derive(Debug, Clone, PartialEq)]
pub struct StatSummary {
    metrics: Vec<String>,
    networks: Vec<NetworkSummary>,
    /// Tracked metrics the table does not contain.
    pub absent_metrics: Vec<String>,
    /// `(network, step)` pairs with no rows although other networks have the step.
    pub missing: Vec<(String, u64)>,
    /// `(network, step, metric)` groups with rows but no value for the metric.
    pub empty_groups: Vec<(String, u64, String)>,
}

impl StatSummary {
    /// Group `table` by `(network, step)` and describe every tracked metric.
    pub fn compute(table: &AggregatedTable, tracked: &[String]) -> Self {
        let mut metrics = Vec::new();
        let mut columns = Vec::new();
        let mut absent_metrics = Vec::new();
        for metric in tracked {
            match table.metric_index(metric) {
                Some(idx) => {
                    metrics.push(metric.clone());
                    columns.push(idx);
                }
                None => {
                    tracing::warn!("Metric {metric:?} not found in the data; skipping it");
                    absent_metrics.push(metric.clone());
                }
            }
        }

        let mut groups: BTreeMap<(&str, u64), Vec<usize>> = BTreeMap::new();
        let mut order: Vec<(&str, Vec<u64>)> = Vec::new();
        for (row_idx, row) in table.rows().iter().enumerate() {
            let network = row.record.network.as_str();
            let step = row.record.step;
            let members = groups.entry((network, step)).or_default();
            if members.is_empty() {
                match order.iter_mut().find(|(name, _)| *name == network) {
                    Some((_, steps)) => steps.push(step),
                    None => order.push((network, vec![step])),
                }
            }
            members.push(row_idx);
        }

        let mut empty_groups = Vec::new();
        let networks = order
            .iter()
            .map(|(network, steps)| NetworkSummary {
                network: network.to_string(),
                steps: steps
                    .iter()
                    .map(|step| {
                        let members = &groups[&(*network, *step)];
                        let described = columns
                            .iter()
                            .zip(&metrics)
                            .map(|(col, metric)| {
                                let values = members
                                    .iter()
                                    .filter_map(|idx| table.rows()[*idx].record.values[*col])
                                    .collect::<Vec<_>>();
                                let summary = describe(&values);
                                if summary.is_empty() {
                                    empty_groups.push((network.to_string(), *step, metric.clone()));
                                }
                                summary
                            })
                            .collect();
                        StepSummary {
                            step: *step,
                            rows: members.len(),
                            metrics: described,
                        }
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        let all_steps: BTreeSet<u64> = groups.keys().map(|(_, step)| *step).collect();
        let mut missing = Vec::new();
        for (network, _) in &order {
            for step in &all_steps {
                if !groups.contains_key(&(*network, *step)) {
                    missing.push((network.to_string(), *step));
                }
            }
        }
        for (network, step) in &missing {
            tracing::warn!("No data for network {network:?} at step {step}");
        }
        for (network, step, metric) in &empty_groups {
            tracing::warn!("No {metric:?} values for network {network:?} at step {step}");
        }

        Self {
            metrics,
            networks,
            absent_metrics,
            missing,
            empty_groups,
        }
    }

    /// Summarized metrics, in tracked order.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn networks(&self) -> &[NetworkSummary] {
        &self.networks
    }

    pub fn network(&self, network: &str) -> Option<&NetworkSummary> {
        self.networks.iter().find(|summary| summary.network == network)
    }

    pub fn get(&self, network: &str, step: u64) -> Option<&StepSummary> {
        self.network(network)?.step(step)
    }

    /// Describe block of one metric for one group.
    pub fn describe(&self, network: &str, step: u64, metric: &str) -> Option<&Describe> {
        let idx = self.metrics.iter().position(|name| name == metric)?;
        self.get(network, step)?.metrics.get(idx)
    }

    /// Mean over networks of the per-network group means at `step`.
    ///
    /// Each network contributes its own group mean once, so networks with more
    /// replicates do not dominate.
    pub fn cross_network_mean(&self, step: u64, metric: &str) -> Option<f64> {
        let means = self
            .networks
            .iter()
            .filter_map(|summary| self.describe(&summary.network, step, metric))
            .map(|describe| describe.mean)
            .collect::<Vec<_>>();
        if means.is_empty() {
            return None;
        }
        Some(mean(&means))
    }

    /// Write one `<network><suffix>` file per network into `dir`.
    ///
    /// Each file has a `(step, stats)` row key followed by one column per
    /// metric. Spaces in network names become underscores in the file name.
    pub fn write_network_files(
        &self,
        dir: &Path,
        suffix: &str,
    ) -> Result<Vec<PathBuf>, StatsError> {
        let mut written = Vec::with_capacity(self.networks.len());
        for summary in &self.networks {
            let path = dir.join(format!("{}{suffix}", summary.network.replace(' ', "_")));
            self.write_network_file(summary, &path)?;
            tracing::info!("Saved statistics of {:?} to {}", summary.network, path.display());
            written.push(path);
        }
        Ok(written)
    }

    fn write_network_file(&self, summary: &NetworkSummary, path: &Path) -> Result<(), StatsError> {
        let write_err = |source| StatsError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = writer_at(path)?;
        let mut header = vec!["step", "stats"];
        header.extend(self.metrics.iter().map(String::as_str));
        writer.write_record(&header).map_err(write_err)?;
        for step in &summary.steps {
            for kind in StatKind::ALL {
                let mut row = vec![step.step.to_string(), kind.to_string()];
                row.extend(step.metrics.iter().map(|describe| format_value(describe.get(kind))));
                writer.write_record(&row).map_err(write_err)?;
            }
        }
        writer
            .flush()
            .map_err(|source| write_err(csv::Error::from(source)))?;
        Ok(())
    }
}
