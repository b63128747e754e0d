//! Box-and-whisker summaries and charts.

use crate::color::Rgb;
use crate::figure::{Annotation, Axis, BoxPoints, BoxTrace, Figure, Line};
use crate::stats::{mean, quantile_sorted};

/// Whisker fence in interquartile ranges.
pub const WHISKER_IQR: f64 = 1.5;
/// Points beyond this many interquartile ranges are extreme outliers.
pub const EXTREME_IQR: f64 = 3.0;

pub const MEAN_OUTSIDE_BOX_NOTE: &str =
    "Dashed lines mark the arithmetic mean, which can fall outside the box.";

/// Quartiles, fences and outliers of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub mean: f64,
    /// Lowest data point inside `q1 - 1.5 IQR`.
    pub lower_whisker: f64,
    /// Highest data point inside `q3 + 1.5 IQR`.
    pub upper_whisker: f64,
    /// Points beyond 1.5 IQR but within 3 IQR of the box.
    pub suspected_outliers: Vec<f64>,
    /// Points beyond 3 IQR of the box.
    pub extreme_outliers: Vec<f64>,
    /// `median ± 1.57 IQR / sqrt(n)`.
    pub notch: (f64, f64),
}

impl BoxStats {
    /// `None` when no finite values remain.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - WHISKER_IQR * iqr, q3 + WHISKER_IQR * iqr);
        let (low_extreme, high_extreme) = (q1 - EXTREME_IQR * iqr, q3 + EXTREME_IQR * iqr);

        let inside = || sorted.iter().copied().filter(|v| *v >= low_fence && *v <= high_fence);
        let lower_whisker = inside().next().unwrap_or(q1);
        let upper_whisker = inside().last().unwrap_or(q3);
        let mut suspected_outliers = Vec::new();
        let mut extreme_outliers = Vec::new();
        for value in &sorted {
            if *value < low_extreme || *value > high_extreme {
                extreme_outliers.push(*value);
            } else if *value < low_fence || *value > high_fence {
                suspected_outliers.push(*value);
            }
        }
        let half_notch = 1.57 * iqr / (sorted.len() as f64).sqrt();
        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            q1,
            median,
            q3,
            mean: mean(&sorted),
            lower_whisker,
            upper_whisker,
            suspected_outliers,
            extreme_outliers,
            notch: (median - half_notch, median + half_notch),
        })
    }

    /// The mean is not a quartile and may lie outside `[q1, q3]`.
    pub fn mean_outside_box(&self) -> bool {
        self.mean < self.q1 || self.mean > self.q3
    }
}

/// One box: a named sample and its color.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxGroup {
    pub name: String,
    pub values: Vec<f64>,
    pub color: Rgb,
}

pub struct BoxLayout<'a> {
    pub title: String,
    pub x_title: Option<&'a str>,
    pub y_title: &'a str,
    pub dtick: f64,
    pub show_legend: bool,
}

/// Notched boxes with mean markers and suspected outliers, filled with the
/// group color at half opacity.
pub fn figure(groups: &[BoxGroup], layout: BoxLayout<'_>) -> Figure {
    let mut figure = Figure::new(layout.title);
    let mut mean_outside = false;
    for group in groups {
        mean_outside |=
            BoxStats::compute(&group.values).is_some_and(|stats| stats.mean_outside_box());
        figure.push(BoxTrace {
            name: group.name.clone(),
            y: group.values.clone(),
            whiskerwidth: 0.2,
            notched: true,
            boxmean: true,
            boxpoints: BoxPoints::SuspectedOutliers,
            fillcolor: Some(group.color.with_alpha(0.5).into()),
            line: Some(Line::colored(group.color)),
        });
    }
    if mean_outside {
        figure.annotate(Annotation::note(0.0, 1.02, MEAN_OUTSIDE_BOX_NOTE));
    }
    figure.layout.xaxis = layout.x_title.map(Axis::titled);
    figure.layout.yaxis = Some(Axis::titled(layout.y_title).dtick(layout.dtick));
    figure.layout.showlegend = Some(layout.show_legend);
    figure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Trace;

    #[test]
    fn quartiles_and_whiskers() {
        let stats = BoxStats::compute(&[1.0, 3.0, 3.0, 6.0, 7.0, 8.0, 9.0]).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (3.0, 6.0, 7.5));
        assert_eq!((stats.lower_whisker, stats.upper_whisker), (1.0, 9.0));
        assert!(stats.suspected_outliers.is_empty());
        assert!(stats.extreme_outliers.is_empty());
    }

    #[test]
    fn outliers_split_by_fence_distance() {
        // q1 = 12.5, q3 = 17.5: fences at 5 / 25, extreme fences at -2.5 / 32.5.
        let values = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 30.0, 50.0];
        let stats = BoxStats::compute(&values).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (12.5, 15.0, 17.5));
        assert_eq!((stats.lower_whisker, stats.upper_whisker), (10.0, 18.0));
        assert_eq!(stats.suspected_outliers, vec![30.0]);
        assert_eq!(stats.extreme_outliers, vec![50.0]);
        let half_notch = 1.57 * 5.0 / 11.0_f64.sqrt();
        assert!((stats.notch.1 - (15.0 + half_notch)).abs() < 1e-12);
    }

    #[test]
    fn mean_can_leave_the_box() {
        let stats = BoxStats::compute(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0]).unwrap();
        assert!(stats.mean_outside_box());
        let groups = vec![BoxGroup {
            name: "A".to_string(),
            values: vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0],
            color: Rgb::new(31, 119, 180),
        }];
        let figure = figure(
            &groups,
            BoxLayout {
                title: "Montecarlo Box Plot test accuracy".to_string(),
                x_title: Some("network"),
                y_title: "test accuracy",
                dtick: 0.05,
                show_legend: false,
            },
        );
        assert_eq!(figure.layout.annotations[0].text, MEAN_OUTSIDE_BOX_NOTE);
        let Trace::Box(trace) = &figure.data[0] else {
            panic!("expected a box trace");
        };
        assert_eq!(
            trace.fillcolor.map(|paint| paint.to_string()).as_deref(),
            Some("rgba(31, 119, 180, 0.5)")
        );
        assert_eq!(figure.layout.yaxis.as_ref().and_then(|axis| axis.dtick), Some(0.05));
    }

    #[test]
    fn empty_sample_has_no_stats() {
        assert!(BoxStats::compute(&[f64::NAN]).is_none());
    }
}
