//! Metric progress over training steps.

use crate::color::palette_color;
use crate::figure::{Annotation, Axis, Figure, Font, Line, Marker, Mode, Scatter};

use super::{display_name, format_decimals};

/// Which extreme of a series gets its own marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

impl Extremum {
    /// Accuracy-like keys peak, everything else (losses) bottoms out.
    pub fn for_key(key: &str) -> Self {
        if key.contains("accuracy") {
            Extremum::Max
        } else {
            Extremum::Min
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Extremum::Min => "min",
            Extremum::Max => "max",
        }
    }

    /// First index holding the extreme finite value.
    pub fn locate(self, values: &[f64]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, value) in values.iter().copied().enumerate() {
            if !value.is_finite() {
                continue;
            }
            let better = match (best, self) {
                (None, _) => true,
                (Some((_, current)), Extremum::Min) => value < current,
                (Some((_, current)), Extremum::Max) => value > current,
            };
            if better {
                best = Some((idx, value));
            }
        }
        best
    }
}

/// Columns of one table to draw against its steps.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSource {
    pub label: String,
    pub x: Vec<f64>,
    /// `(column name, values)` aligned with `x`.
    pub columns: Vec<(String, Vec<f64>)>,
}

fn last_finite(x: &[f64], y: &[f64]) -> Option<(usize, f64, f64)> {
    x.iter()
        .zip(y)
        .enumerate()
        .rev()
        .find(|(_, (x, y))| x.is_finite() && y.is_finite())
        .map(|(idx, (x, y))| (idx, *x, *y))
}

/// One line per column, with last-value and extremum markers and annotations.
///
/// Column `j` of table `i` out of `n` tables uses palette entry `j * n + i`.
/// The extremum marker is omitted when the extremum is the last point.
pub fn progress_figure(
    sources: &[LineSource],
    key: &str,
    extremum: Extremum,
    decimals: usize,
) -> Figure {
    let labels: Vec<&str> = sources.iter().map(|source| source.label.as_str()).collect();
    let mut figure = Figure::new(format!("{} {key}", labels.join(" vs. ")));
    let n = sources.len();
    for (i, source) in sources.iter().enumerate() {
        for (j, (column, values)) in source.columns.iter().enumerate() {
            let color = palette_color(j * n + i);
            let name = display_name(&format!("{}{}", column.replace(key, ""), source.label));
            figure.push(
                Scatter::new(source.x.clone(), values.clone(), Mode::Lines)
                    .named(name)
                    .line(Line::colored(color)),
            );
            let Some((last_idx, last_x, last_y)) = last_finite(&source.x, values) else {
                continue;
            };
            figure.push(
                Scatter::new(vec![last_x], vec![last_y], Mode::Markers)
                    .named("last value")
                    .marker(Marker::colored(color)),
            );
            if let Some((idx, value)) = extremum.locate(values)
                && idx != last_idx
            {
                let x = source.x[idx];
                figure.push(
                    Scatter::new(vec![x], vec![value], Mode::Markers)
                        .named(extremum.name())
                        .marker(Marker::colored(color))
                        .text(vec![format!("{}%", format_decimals(value, decimals))], "top center"),
                );
                figure.annotate(Annotation::at_data(
                    x,
                    value,
                    format_decimals(value, decimals),
                    Font::arial(14.0),
                ));
            }
            figure.annotate(Annotation::at_paper_x(
                0.95,
                last_y,
                format_decimals(last_y, decimals),
                Font::arial(16.0),
            ));
        }
    }
    figure.layout.xaxis = Some(Axis::titled("steps"));
    figure.layout.yaxis = Some(Axis::titled(key));
    figure
}

/// Test and train series of one network for one statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSeries {
    pub label: String,
    pub steps: Vec<f64>,
    pub test: Option<Vec<f64>>,
    pub train: Option<Vec<f64>>,
}

/// `train <key>` against `test <key>` for every network.
///
/// `statistic` names the plotted row (`mean` or `median`). Network `i` of `n`
/// uses palette entry `i` for test and `i + n` for train.
pub fn train_vs_test_figure(series: &[TrainTestSeries], key: &str, statistic: &str) -> Figure {
    let mut figure = Figure::new(format!("train and test {key} {statistic}"));
    let n = series.len();
    for (i, network) in series.iter().enumerate() {
        let label = display_name(&network.label);
        if let Some(test) = &network.test {
            figure.push(
                Scatter::new(network.steps.clone(), test.clone(), Mode::Lines)
                    .named(format!("{label} test"))
                    .line(Line::colored(palette_color(i))),
            );
        }
        if let Some(train) = &network.train {
            figure.push(
                Scatter::new(network.steps.clone(), train.clone(), Mode::Lines)
                    .named(format!("{label} train"))
                    .line(Line::colored(palette_color(i + n))),
            );
        }
    }
    figure.layout.xaxis = Some(Axis::titled("steps"));
    figure.layout.yaxis = Some(Axis::titled(key));
    figure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::figure::Trace;

    fn source(label: &str, loss: Vec<f64>) -> LineSource {
        LineSource {
            label: label.to_string(),
            x: (0..loss.len()).map(|step| step as f64).collect(),
            columns: vec![
                ("train loss".to_string(), loss.clone()),
                ("test loss".to_string(), loss.iter().map(|v| v + 0.1).collect()),
            ],
        }
    }

    fn scatter(trace: &Trace) -> &Scatter {
        match trace {
            Trace::Scatter(scatter) => scatter,
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn extremum_is_first_occurrence() {
        assert_eq!(Extremum::Min.locate(&[0.5, 0.2, f64::NAN, 0.2]), Some((1, 0.2)));
        assert_eq!(Extremum::Max.locate(&[0.1, 0.9, 0.9]), Some((1, 0.9)));
        assert_eq!(Extremum::Min.locate(&[f64::NAN]), None);
        assert_eq!(Extremum::for_key("test accuracy"), Extremum::Max);
        assert_eq!(Extremum::for_key("loss"), Extremum::Min);
    }

    #[test]
    fn progress_lines_get_markers_and_annotations() {
        let sources = [source("complex_net", vec![1.0, 0.3, 0.6])];
        let figure = progress_figure(&sources, "loss", Extremum::Min, 2);
        assert_eq!(figure.title(), "complex_net loss");
        // line + last + min for each of the two columns
        assert_eq!(figure.data.len(), 6);
        let line = scatter(&figure.data[0]);
        assert_eq!(line.name.as_deref(), Some("train complex net"));
        let min = scatter(&figure.data[2]);
        assert_eq!(min.name.as_deref(), Some("min"));
        assert_eq!((min.x[0], min.y[0]), (1.0, 0.3));
        assert_eq!(min.text, vec!["0.30%"]);
        assert_eq!(figure.layout.annotations.len(), 4);
        assert_eq!(figure.layout.annotations[1].text, "0.60");
    }

    #[test]
    fn extremum_at_last_point_has_no_marker() {
        let figure = progress_figure(&[source("a", vec![1.0, 0.5, 0.1])], "loss", Extremum::Min, 2);
        assert_eq!(figure.data.len(), 4);
        assert_eq!(figure.layout.annotations.len(), 2);
    }

    #[test]
    fn colors_interleave_tables_and_columns() {
        let figure = progress_figure(
            &[source("a", vec![1.0, 0.5]), source("b", vec![0.9, 0.4])],
            "loss",
            Extremum::Min,
            2,
        );
        assert_eq!(figure.title(), "a vs. b loss");
        let lines: Vec<(String, Rgb)> = figure
            .data
            .iter()
            .map(scatter)
            .filter(|trace| trace.mode == Mode::Lines)
            .map(|trace| (trace.name.clone().unwrap_or_default(), trace.color().unwrap().rgb()))
            .collect();
        assert_eq!(lines[0], ("train a".to_string(), palette_color(0)));
        assert_eq!(lines[1], ("test a".to_string(), palette_color(2)));
        assert_eq!(lines[2], ("train b".to_string(), palette_color(1)));
        assert_eq!(lines[3], ("test b".to_string(), palette_color(3)));
    }

    #[test]
    fn train_vs_test_skips_missing_series() {
        let series = vec![
            TrainTestSeries {
                label: "net_a".to_string(),
                steps: vec![0.0, 1.0],
                test: Some(vec![0.5, 0.6]),
                train: Some(vec![0.55, 0.7]),
            },
            TrainTestSeries {
                label: "net_b".to_string(),
                steps: vec![0.0, 1.0],
                test: Some(vec![0.4, 0.5]),
                train: None,
            },
        ];
        let figure = train_vs_test_figure(&series, "accuracy", "median");
        assert_eq!(figure.title(), "train and test accuracy median");
        assert_eq!(figure.data.len(), 3);
        let train = scatter(&figure.data[1]);
        assert_eq!(train.name.as_deref(), Some("net a train"));
        assert_eq!(train.color().unwrap().rgb(), palette_color(2));
    }
}
