//! Overlaid 2-D histograms and stacked 3-D staircase histograms.

use thiserror::Error;

use crate::color::Rgb;
use crate::figure::{
    Axis, BarMode, Bins, Figure, Histogram, Line, Marker, Mesh3d, Mode, Scatter3d, Scene,
};

use super::display_name;

/// Staircase outlines that cannot be turned into a bar mesh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// Coordinate lists differ in length.
    #[error("x, y and z must have the same length (got {x}, {y}, {z})")]
    LengthMismatch { x: usize, y: usize, z: usize },
    /// Staircases come in edge pairs; an odd count means a dropped point.
    #[error("Staircase point count must be even, got {0}")]
    OddPointCount(usize),
    /// At least one bar (six outline points) is needed.
    #[error("Staircase needs at least 6 points, got {0}")]
    TooFewPoints(usize),
}

/// Counts per equal-width bin and the `counts.len() + 1` bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedCounts {
    pub counts: Vec<usize>,
    pub edges: Vec<f64>,
}

/// Equal-width bins over `[min, max]` of the finite values.
///
/// The last bin is closed on the right. A single distinct value is binned
/// over `[v - 0.5, v + 0.5]`, and no values at all over `[0, 1]`.
pub fn bin_counts(values: &[f64], bins: usize) -> BinnedCounts {
    let bins = bins.max(1);
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (mut low, mut high) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), v| (low.min(*v), high.max(*v)));
    if finite.is_empty() {
        (low, high) = (0.0, 1.0);
    } else if low == high {
        (low, high) = (low - 0.5, high + 0.5);
    }
    let width = (high - low) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|idx| if idx == bins { high } else { low + width * idx as f64 })
        .collect();
    let mut counts = vec![0; bins];
    for value in finite {
        let idx = (((value - low) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    BinnedCounts { counts, edges }
}

/// Outline `(y, z)` of a histogram drawn as one connected polyline.
///
/// Every edge and count appears twice, and the counts are padded with a zero
/// at both ends so the outline starts and ends on the baseline.
pub fn staircase(counts: &[usize], edges: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let y = edges.iter().flat_map(|edge| [*edge, *edge]).collect();
    let z = std::iter::once(0.0)
        .chain(counts.iter().flat_map(|count| [*count as f64, *count as f64]))
        .chain(std::iter::once(0.0))
        .collect();
    (y, z)
}

/// Triangle mesh filling a staircase outline down to `z = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[usize; 3]>,
}

/// Fill the area under a staircase.
///
/// Baseline points are appended under every inner bar corner, then each bar
/// is split into two triangles fanning from its baseline point.
pub fn triangulate(x: &[f64], y: &[f64], z: &[f64]) -> Result<Mesh, MeshError> {
    let n = x.len();
    if n != y.len() || n != z.len() {
        return Err(MeshError::LengthMismatch {
            x: n,
            y: y.len(),
            z: z.len(),
        });
    }
    if n % 2 == 1 {
        return Err(MeshError::OddPointCount(n));
    }
    if n < 6 {
        return Err(MeshError::TooFewPoints(n));
    }
    let half = n / 2;
    let mut vertices: Vec<[f64; 3]> = (0..n).map(|idx| [x[idx], y[idx], z[idx]]).collect();
    vertices.extend((1..half - 1).map(|k| [x[2 * k + 1], y[2 * k + 1], 0.0]));

    let mut triangles = vec![[0, 1, 2], [0, 2, n]];
    for (k, i) in (n..n - 3 + half).zip((3..n - 4).step_by(2)) {
        triangles.push([k, i, i + 1]);
        triangles.push([k, i + 1, k + 1]);
    }
    let last = n - 3 + half;
    triangles.push([last, n - 3, n - 2]);
    triangles.push([last, n - 2, n - 1]);
    Ok(Mesh { vertices, triangles })
}

/// Up to `count` steps spaced evenly in log2 between the smallest and the
/// largest present step, each snapped to the closest present step.
///
/// The smallest step is always first; duplicates after snapping are dropped.
pub fn default_steps(steps: &[u64], count: usize) -> Vec<u64> {
    let mut present = steps.to_vec();
    present.sort_unstable();
    present.dedup();
    let (Some(&first), Some(&last)) = (present.first(), present.last()) else {
        return Vec::new();
    };
    if count <= 1 || first == last {
        return vec![first];
    }
    let low = (first.max(1) as f64).log2();
    let high = (last.max(1) as f64).log2();
    let mut chosen = vec![first];
    for idx in 1..count {
        let target = (low + (high - low) * idx as f64 / (count - 1) as f64).exp2();
        let snapped = present
            .iter()
            .copied()
            .min_by(|a, b| (*a as f64 - target).abs().total_cmp(&(*b as f64 - target).abs()))
            .unwrap_or(last);
        if !chosen.contains(&snapped) {
            chosen.push(snapped);
        }
    }
    chosen
}

/// Values of one network at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Hist3dGroup {
    pub network: String,
    pub step: u64,
    pub values: Vec<f64>,
    pub color: Rgb,
}

/// One staircase outline and its filled mesh per `(network, step)`, laid out
/// along a logarithmic step axis.
pub fn figure_3d(groups: &[Hist3dGroup], key: &str, bins: usize) -> Result<Figure, MeshError> {
    let mut networks: Vec<&str> = Vec::new();
    for group in groups {
        if !networks.contains(&group.network.as_str()) {
            networks.push(&group.network);
        }
    }
    let names: Vec<String> = networks.iter().map(|name| display_name(name)).collect();
    let mut figure = Figure::new(format!("{} {key} comparison", names.join(" ")));
    for group in groups {
        let binned = bin_counts(&group.values, bins);
        let (y, z) = staircase(&binned.counts, &binned.edges);
        let x = vec![group.step as f64; y.len()];
        let mesh = triangulate(&x, &y, &z)?;
        figure.push(Scatter3d {
            name: Some(format!("{}; step: {}", display_name(&group.network), group.step)),
            x,
            y,
            z,
            mode: Mode::Lines,
            line: Some(Line::colored(group.color).width(4.0)),
            surfacecolor: Some(group.color.with_alpha(0.0).into()),
        });
        let column = |axis: usize| -> Vec<f64> {
            mesh.vertices.iter().map(|vertex| vertex[axis]).collect()
        };
        let corner = |idx: usize| -> Vec<usize> {
            mesh.triangles.iter().map(|triangle| triangle[idx]).collect()
        };
        figure.push(Mesh3d {
            name: None,
            x: column(0),
            y: column(1),
            z: column(2),
            i: corner(0),
            j: corner(1),
            k: corner(2),
            color: Some(group.color.into()),
            opacity: 0.4,
        });
    }
    figure.layout.scene = Some(Scene {
        xaxis: Axis::titled("step").log(),
        yaxis: Axis::titled(key),
        zaxis: Axis::titled("counts"),
    });
    Ok(figure)
}

/// Values of one series in an overlay histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistGroup {
    pub name: String,
    pub values: Vec<f64>,
    pub color: Rgb,
}

/// Translucent histograms of every group on shared bins of width `bin_size`.
pub fn overlay_figure(groups: &[HistGroup], key: &str, bin_size: f64) -> Figure {
    let names: Vec<String> = groups.iter().map(|group| display_name(&group.name)).collect();
    let mut figure = Figure::new(format!("{} {key} comparison", names.join(" ")));
    let (start, end) = groups
        .iter()
        .flat_map(|group| group.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), v| (low.min(v), high.max(v)));
    for group in groups.iter().filter(|group| !group.values.is_empty()) {
        figure.push(Histogram {
            name: Some(display_name(&group.name)),
            x: group.values.clone(),
            xbins: start.is_finite().then_some(Bins {
                start,
                end: end + bin_size,
                size: bin_size,
            }),
            opacity: Some(0.75),
            marker: Some(Marker::colored(group.color)),
        });
    }
    figure.layout.xaxis = Some(Axis::titled(key));
    figure.layout.yaxis = Some(Axis::titled("occurrences"));
    figure.layout.barmode = Some(BarMode::Overlay);
    figure
}
