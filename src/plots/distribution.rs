//! Percentile bands of a metric over steps, one set per network.

use crate::color::Rgb;
use crate::figure::{Axis, Figure, Line, Mode, RenderError, Scatter};
use crate::stats::{NetworkStats, StatKind};

use super::display_name;

/// Closed polygon through `upper` forwards and `lower` backwards.
///
/// The result is `x ++ reverse(x)` against `upper ++ reverse(lower)`, which
/// closes the band without crossing itself.
pub fn band_polygon(
    x: &[f64],
    upper: &[f64],
    lower: &[f64],
) -> Result<(Vec<f64>, Vec<f64>), RenderError> {
    for (series, values) in [("upper", upper), ("lower", lower)] {
        if values.len() != x.len() {
            return Err(RenderError::LengthMismatch {
                series: series.to_string(),
                expected: x.len(),
                found: values.len(),
            });
        }
    }
    let xs = x.iter().chain(x.iter().rev()).copied().collect();
    let ys = upper.iter().chain(lower.iter().rev()).copied().collect();
    Ok((xs, ys))
}

/// Per-step statistics of one network for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSeries {
    pub label: String,
    pub color: Rgb,
    pub steps: Vec<f64>,
    pub min: Vec<f64>,
    pub q25: Vec<f64>,
    pub median: Vec<f64>,
    pub mean: Vec<f64>,
    pub q75: Vec<f64>,
    pub max: Vec<f64>,
}

impl BandSeries {
    /// Pull the band rows of `key` out of a statistics file.
    ///
    /// `None` when the metric or one of the needed statistics is absent.
    pub fn from_stats(stats: &NetworkStats, key: &str, color: Rgb) -> Option<Self> {
        let series = |kind| stats.series(kind, key);
        Some(Self {
            label: stats.label.clone(),
            color,
            steps: stats.steps().iter().map(|step| *step as f64).collect(),
            min: series(StatKind::Min)?,
            q25: series(StatKind::Q25)?,
            median: series(StatKind::Median)?,
            mean: series(StatKind::Mean)?,
            q75: series(StatKind::Q75)?,
            max: series(StatKind::Max)?,
        })
    }
}

/// `[min, max]` (if `full_border`) and interquartile bands, the mean line and
/// a dashed median line for every network.
pub fn band_figure(
    series: &[BandSeries],
    key: &str,
    full_border: bool,
) -> Result<Figure, RenderError> {
    let labels: Vec<String> = series.iter().map(|band| display_name(&band.label)).collect();
    let mut figure = Figure::new(format!("{} {key}", labels.join(" vs ")));
    for (band, label) in series.iter().zip(&labels) {
        let clear = band.color.with_alpha(0.0);
        if full_border {
            let (x, y) = band_polygon(&band.steps, &band.max, &band.min)?;
            let mut trace = Scatter::new(x, y, Mode::Lines)
                .named(format!("{label} borders"))
                .line(Line::colored(clear))
                .filled(band.color.with_alpha(0.1));
            trace.showlegend = Some(true);
            figure.push(trace);
        }
        let (x, y) = band_polygon(&band.steps, &band.q75, &band.q25)?;
        let mut trace = Scatter::new(x, y, Mode::Lines)
            .named(format!("{label} interquartile"))
            .line(Line::colored(clear))
            .filled(band.color.with_alpha(0.2));
        trace.showlegend = Some(true);
        figure.push(trace);
        figure.push(
            Scatter::new(band.steps.clone(), band.mean.clone(), Mode::Lines)
                .named(format!("{label} mean"))
                .line(Line::colored(band.color)),
        );
        figure.push(
            Scatter::new(band.steps.clone(), band.median.clone(), Mode::Lines)
                .named(format!("{label} median"))
                .line(Line::colored(band.color).dashed()),
        );
    }
    figure.layout.xaxis = Some(Axis::titled("steps"));
    figure.layout.yaxis = Some(Axis::titled(key));
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Dash, Fill, Trace};

    fn band() -> BandSeries {
        BandSeries {
            label: "complex_net".to_string(),
            color: Rgb::new(31, 119, 180),
            steps: vec![0.0, 1.0, 2.0],
            min: vec![0.1, 0.2, 0.3],
            q25: vec![0.2, 0.3, 0.4],
            median: vec![0.3, 0.4, 0.5],
            mean: vec![0.3, 0.45, 0.5],
            q75: vec![0.4, 0.5, 0.6],
            max: vec![0.5, 0.6, 0.7],
        }
    }

    #[test]
    fn polygon_runs_forward_then_back() {
        let (x, y) = band_polygon(&[0.0, 1.0, 2.0], &[3.0, 4.0, 5.0], &[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(x, vec![0.0, 1.0, 2.0, 2.0, 1.0, 0.0]);
        assert_eq!(y, vec![3.0, 4.0, 5.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn polygon_rejects_ragged_bounds() {
        assert!(matches!(
            band_polygon(&[0.0, 1.0], &[1.0, 2.0], &[0.0]),
            Err(RenderError::LengthMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn bands_lines_and_dashed_median() {
        let figure = band_figure(&[band()], "test accuracy", true).unwrap();
        assert_eq!(figure.title(), "complex net test accuracy");
        assert_eq!(figure.data.len(), 4);
        let Trace::Scatter(border) = &figure.data[0] else {
            panic!("expected scatter");
        };
        assert_eq!(border.fill, Some(Fill::ToSelf));
        assert_eq!(
            border.fillcolor.map(|paint| paint.to_string()),
            Some("rgba(31, 119, 180, 0.1)".to_string())
        );
        assert_eq!(border.y[..3], [0.5, 0.6, 0.7]);
        let Trace::Scatter(median) = &figure.data[3] else {
            panic!("expected scatter");
        };
        assert_eq!(median.line.as_ref().and_then(|line| line.dash), Some(Dash::Dash));

        let narrow = band_figure(&[band()], "test accuracy", false).unwrap();
        assert_eq!(narrow.data.len(), 3);
    }
}
