//! Static SVG rendering of 2-D figures with `plotters`.

use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{
    Annotation, Axis, BoxTrace, Figure, Heatmap, Histogram, Ref, RenderError, Scatter, Trace,
};
use crate::color::{Paint, palette_color};
use crate::plots::boxplot::BoxStats;

const SIZE: (u32, u32) = (1200, 700);
const FONT: &str = "sans-serif";

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Draw `figure` to an SVG file at `path`.
///
/// Heatmaps and box plots get their own categorical layouts; everything else
/// shares one cartesian chart. 3-D traces are rejected.
pub fn render(figure: &Figure, path: &Path) -> Result<(), RenderError> {
    if figure.is_3d() {
        return Err(RenderError::Unsupported {
            format: "SVG",
            what: "3-D traces",
        });
    }
    if figure.is_empty() {
        return Err(RenderError::EmptyFigure(figure.title().to_string()));
    }
    figure.validate()?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| RenderError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let heatmap = figure.data.iter().find_map(|trace| match trace {
        Trace::Heatmap(heatmap) => Some(heatmap),
        _ => None,
    });
    let boxes: Vec<&BoxTrace> = figure
        .data
        .iter()
        .filter_map(|trace| match trace {
            Trace::Box(trace) => Some(trace),
            _ => None,
        })
        .collect();
    if let Some(heatmap) = heatmap {
        draw_heatmap(&root, figure, heatmap)?;
    } else if !boxes.is_empty() {
        draw_boxes(&root, figure, &boxes)?;
    } else {
        draw_cartesian(&root, figure)?;
    }
    root.present().map_err(draw_err)?;
    Ok(())
}

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

fn to_color(paint: Paint) -> RGBAColor {
    let rgb = paint.rgb();
    RGBColor(rgb.r, rgb.g, rgb.b).mix(paint.alpha())
}

fn axis_title(axis: &Option<Axis>) -> String {
    axis.as_ref().map(Axis::title_text).unwrap_or_default().to_string()
}

#[derive(Debug, Default, Clone, Copy)]
struct Extent {
    bounds: Option<(f64, f64)>,
}

impl Extent {
    fn add(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.bounds = Some(match self.bounds {
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
            None => (value, value),
        });
    }

    fn padded(self) -> Range<f64> {
        let (lo, hi) = self.bounds.unwrap_or((0.0, 1.0));
        if hi - lo <= f64::EPSILON {
            return lo - 0.5..hi + 0.5;
        }
        let pad = (hi - lo) * 0.05;
        lo - pad..hi + pad
    }
}

/// Bars of an overlaid histogram as `(left, right, count)`.
fn histogram_bars(trace: &Histogram) -> Vec<(f64, f64, f64)> {
    let values: Vec<f64> = trace.x.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    let (start, size) = match trace.xbins {
        Some(bins) if bins.size > 0.0 => (bins.start.min(min), bins.size),
        _ if max > min => (min, (max - min) / 10.0),
        _ => (min - 0.5, 1.0),
    };
    let count = (((max - start) / size).floor() as usize + 1).max(1);
    let mut counts = vec![0.0; count];
    for value in values {
        let idx = (((value - start) / size).floor() as usize).min(count - 1);
        counts[idx] += 1.0;
    }
    counts
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0.0)
        .map(|(idx, count)| {
            let left = start + idx as f64 * size;
            (left, left + size, count)
        })
        .collect()
}

/// Split a polyline at non-finite points.
fn segments(x: &[f64], y: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (x, y) in x.iter().zip(y) {
        if x.is_finite() && y.is_finite() {
            current.push((*x, *y));
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn annotation_position(annotation: &Annotation, x: &Range<f64>, y: &Range<f64>) -> (f64, f64) {
    let along = |reference: Ref, value: f64, range: &Range<f64>| match reference {
        Ref::Paper => range.start + value * (range.end - range.start),
        Ref::X | Ref::Y => value,
    };
    (
        along(annotation.xref, annotation.x, x),
        along(annotation.yref, annotation.y, y),
    )
}

fn annotation_style(annotation: &Annotation) -> TextStyle<'static> {
    let size = annotation.font.as_ref().map(|font| font.size).unwrap_or(14.0);
    let hpos = match annotation.xanchor.as_str() {
        "right" => HPos::Right,
        "center" => HPos::Center,
        _ => HPos::Left,
    };
    let vpos = match annotation.yanchor.as_str() {
        "top" => VPos::Top,
        "bottom" => VPos::Bottom,
        _ => VPos::Center,
    };
    TextStyle::from((FONT, size)).pos(Pos::new(hpos, vpos))
}

fn draw_cartesian(root: &Area<'_>, figure: &Figure) -> Result<(), RenderError> {
    let mut x_extent = Extent::default();
    let mut y_extent = Extent::default();
    let mut bars = Vec::new();
    for (idx, trace) in figure.data.iter().enumerate() {
        match trace {
            Trace::Scatter(trace) => {
                trace.x.iter().for_each(|v| x_extent.add(*v));
                trace.y.iter().for_each(|v| y_extent.add(*v));
            }
            Trace::Histogram(trace) => {
                let trace_bars = histogram_bars(trace);
                for (left, right, count) in &trace_bars {
                    x_extent.add(*left);
                    x_extent.add(*right);
                    y_extent.add(*count);
                }
                y_extent.add(0.0);
                bars.push((idx, trace, trace_bars));
            }
            _ => {}
        }
    }
    for annotation in &figure.layout.annotations {
        if annotation.yref == Ref::Y {
            y_extent.add(annotation.y);
        }
    }
    let x_range = x_extent.padded();
    let y_range = y_extent.padded();

    let mut chart = ChartBuilder::on(root)
        .caption(figure.title(), (FONT, 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc(axis_title(&figure.layout.xaxis))
        .y_desc(axis_title(&figure.layout.yaxis))
        .draw()
        .map_err(draw_err)?;

    let mut labeled = false;
    for (idx, trace, trace_bars) in &bars {
        let paint = trace
            .marker
            .as_ref()
            .and_then(|marker| marker.color)
            .unwrap_or_else(|| palette_color(*idx).into());
        let color = to_color(paint).mix(trace.opacity.unwrap_or(0.75));
        let anno = chart
            .draw_series(trace_bars.iter().map(|(left, right, count)| {
                Rectangle::new([(*left, 0.0), (*right, *count)], color.filled())
            }))
            .map_err(draw_err)?;
        if let Some(name) = &trace.name {
            labeled = true;
            anno.label(name.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled())
                });
        }
    }

    for (idx, trace) in figure.data.iter().enumerate() {
        let Trace::Scatter(trace) = trace else {
            continue;
        };
        labeled |= draw_scatter(&mut chart, trace, idx)?;
    }

    for annotation in &figure.layout.annotations {
        let position = annotation_position(annotation, &x_range, &y_range);
        chart
            .draw_series(std::iter::once(Text::new(
                annotation.text.clone(),
                position,
                annotation_style(annotation),
            )))
            .map_err(draw_err)?;
    }

    if labeled {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;
    }
    Ok(())
}

type Cartesian<'a, 'b> =
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Draw one scatter trace; returns whether it registered a legend entry.
fn draw_scatter(
    chart: &mut Cartesian<'_, '_>,
    trace: &Scatter,
    idx: usize,
) -> Result<bool, RenderError> {
    let paint = trace.color().unwrap_or_else(|| palette_color(idx).into());
    let color = to_color(paint);
    let mut legend_color = color;

    if let Some(fill) = trace.fillcolor {
        let fill = to_color(fill);
        legend_color = fill;
        let points: Vec<(f64, f64)> = trace
            .x
            .iter()
            .zip(&trace.y)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(x, y)| (*x, *y))
            .collect();
        let anno = chart
            .draw_series(std::iter::once(Polygon::new(points, fill.filled())))
            .map_err(draw_err)?;
        if trace.shows_legend() {
            let name = trace.name.clone().unwrap_or_default();
            anno.label(name)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], fill.filled()));
            return Ok(true);
        }
        return Ok(false);
    }

    let width = trace
        .line
        .as_ref()
        .and_then(|line| line.width)
        .unwrap_or(2.0)
        .round()
        .max(1.0) as u32;
    let dashed = trace
        .line
        .as_ref()
        .is_some_and(|line| line.dash == Some(super::Dash::Dash));
    let mut labeled = false;
    if trace.mode.has_lines() && color.3 > 0.0 {
        let stroke = if dashed { 1 } else { width };
        for (segment_idx, segment) in segments(&trace.x, &trace.y).into_iter().enumerate() {
            let marks = if dashed { segment.clone() } else { Vec::new() };
            let anno = chart
                .draw_series(LineSeries::new(segment, color.stroke_width(stroke)))
                .map_err(draw_err)?;
            if segment_idx == 0 && trace.shows_legend() {
                labeled = true;
                let name = trace.name.clone().unwrap_or_default();
                anno.label(name).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], legend_color.stroke_width(stroke))
                });
            }
            // Dashed strokes are drawn as a thin line with dot marks.
            chart
                .draw_series(marks.into_iter().map(|point| Circle::new(point, 2, color.filled())))
                .map_err(draw_err)?;
        }
    }
    if trace.mode.has_markers() {
        let size = trace
            .marker
            .as_ref()
            .and_then(|marker| marker.size)
            .unwrap_or(6.0)
            .round()
            .max(1.0) as u32;
        let points = segments(&trace.x, &trace.y).concat();
        let anno = chart
            .draw_series(points.iter().map(|point| Circle::new(*point, size, color.filled())))
            .map_err(draw_err)?;
        if !labeled && trace.shows_legend() {
            labeled = true;
            let name = trace.name.clone().unwrap_or_default();
            anno.label(name)
                .legend(move |(x, y)| Circle::new((x + 10, y), size, legend_color.filled()));
        }
    }
    if !trace.text.is_empty() {
        let style = TextStyle::from((FONT, 12.0)).pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(
                trace
                    .x
                    .iter()
                    .zip(&trace.y)
                    .zip(&trace.text)
                    .filter(|((x, y), _)| x.is_finite() && y.is_finite())
                    .map(|((x, y), text)| Text::new(text.clone(), (*x, *y), style.clone())),
            )
            .map_err(draw_err)?;
    }
    Ok(labeled)
}

fn draw_boxes(root: &Area<'_>, figure: &Figure, boxes: &[&BoxTrace]) -> Result<(), RenderError> {
    let stats: Vec<Option<BoxStats>> =
        boxes.iter().map(|trace| BoxStats::compute(&trace.y)).collect();
    let mut y_extent = Extent::default();
    for summary in stats.iter().flatten() {
        y_extent.add(summary.min);
        y_extent.add(summary.max);
    }
    let names: Vec<String> = boxes.iter().map(|trace| trace.name.clone()).collect();
    let x_range = -0.5..boxes.len() as f64 - 0.5;
    let y_range = y_extent.padded();

    let mut chart = ChartBuilder::on(root)
        .caption(figure.title(), (FONT, 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(draw_err)?;
    let label_of = |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        names.get(idx as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len().max(1))
        .x_label_formatter(&label_of)
        .x_desc(axis_title(&figure.layout.xaxis))
        .y_desc(axis_title(&figure.layout.yaxis))
        .draw()
        .map_err(draw_err)?;

    for (idx, (trace, summary)) in boxes.iter().zip(&stats).enumerate() {
        let Some(summary) = summary else {
            continue;
        };
        let center = idx as f64;
        let paint = trace
            .line
            .as_ref()
            .and_then(|line| line.color)
            .unwrap_or_else(|| palette_color(idx).into());
        let color = to_color(paint);
        let fill = trace.fillcolor.map(to_color).unwrap_or_else(|| color.mix(0.5));
        let half = 0.3;
        let cap = half * trace.whiskerwidth.clamp(0.0, 1.0);

        chart
            .draw_series([
                Rectangle::new(
                    [(center - half, summary.q1), (center + half, summary.q3)],
                    fill.filled(),
                ),
                Rectangle::new(
                    [(center - half, summary.q1), (center + half, summary.q3)],
                    color.stroke_width(2),
                ),
            ])
            .map_err(draw_err)?;
        let mut lines = vec![
            vec![(center - half, summary.median), (center + half, summary.median)],
            vec![(center, summary.q3), (center, summary.upper_whisker)],
            vec![(center, summary.q1), (center, summary.lower_whisker)],
            vec![(center - cap, summary.upper_whisker), (center + cap, summary.upper_whisker)],
            vec![(center - cap, summary.lower_whisker), (center + cap, summary.lower_whisker)],
        ];
        if trace.notched {
            let (low, high) = summary.notch;
            for edge in [center - half, center + half] {
                let waist = (edge + center) / 2.0;
                lines.push(vec![(edge, low), (waist, summary.median), (edge, high)]);
            }
        }
        chart
            .draw_series(
                lines
                    .into_iter()
                    .map(|points| PathElement::new(points, color.stroke_width(2))),
            )
            .map_err(draw_err)?;
        if trace.boxmean {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(center - half, summary.mean), (center + half, summary.mean)],
                    color.stroke_width(1),
                )))
                .map_err(draw_err)?;
        }
        chart
            .draw_series(
                summary
                    .suspected_outliers
                    .iter()
                    .map(|value| Circle::new((center, *value), 4, color.stroke_width(1))),
            )
            .map_err(draw_err)?;
        chart
            .draw_series(
                summary
                    .extreme_outliers
                    .iter()
                    .map(|value| Circle::new((center, *value), 4, color.filled())),
            )
            .map_err(draw_err)?;
    }

    for annotation in &figure.layout.annotations {
        let position = annotation_position(annotation, &x_range, &y_range);
        chart
            .draw_series(std::iter::once(Text::new(
                annotation.text.clone(),
                position,
                annotation_style(annotation),
            )))
            .map_err(draw_err)?;
    }
    Ok(())
}

fn draw_heatmap(root: &Area<'_>, figure: &Figure, heatmap: &Heatmap) -> Result<(), RenderError> {
    let rows = heatmap.y.len();
    let cols = heatmap.x.len();
    let max = heatmap
        .z
        .iter()
        .flatten()
        .copied()
        .filter(|value| value.is_finite())
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(root)
        .caption(figure.title(), (FONT, 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0..cols).into_segmented(), (0..rows).into_segmented())
        .map_err(draw_err)?;
    let column_label = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(idx) => heatmap.x.get(*idx).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    // Row 0 is drawn at the top.
    let row_label = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(idx) if *idx < rows => {
            heatmap.y.get(rows - 1 - *idx).cloned().unwrap_or_default()
        }
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .x_label_formatter(&column_label)
        .y_label_formatter(&row_label)
        .x_desc(axis_title(&figure.layout.xaxis))
        .y_desc(axis_title(&figure.layout.yaxis))
        .draw()
        .map_err(draw_err)?;

    let mut cells = Vec::with_capacity(rows * cols);
    let mut labels = Vec::with_capacity(rows * cols);
    for (row_idx, row) in heatmap.z.iter().enumerate() {
        let y = rows - 1 - row_idx;
        for (col_idx, value) in row.iter().enumerate() {
            let t = if max > 0.0 && value.is_finite() {
                (value / max).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let shade = |full: u8| (255.0 - t * (255.0 - full as f64)).round() as u8;
            cells.push(Rectangle::new(
                [
                    (SegmentValue::Exact(col_idx), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(col_idx + 1), SegmentValue::Exact(y + 1)),
                ],
                RGBColor(shade(31), shade(119), shade(180)).filled(),
            ));
            let style = TextStyle::from((FONT, 16.0)).pos(Pos::new(HPos::Center, VPos::Center));
            let style = if t > 0.5 { style.color(&WHITE) } else { style.color(&BLACK) };
            labels.push(Text::new(
                format_cell(*value),
                (SegmentValue::CenterOf(col_idx), SegmentValue::CenterOf(y)),
                style,
            ));
        }
    }
    chart.draw_series(cells).map_err(draw_err)?;
    chart.draw_series(labels).map_err(draw_err)?;
    Ok(())
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Bins, Mode};

    #[test]
    fn segments_break_at_missing_points() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, f64::NAN, 2.0, 3.0];
        assert_eq!(segments(&x, &y), vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]);
    }

    #[test]
    fn histogram_bars_follow_bin_size() {
        let trace = Histogram {
            name: None,
            x: vec![0.10, 0.11, 0.125, 0.13],
            xbins: Some(Bins {
                start: 0.1,
                end: 0.14,
                size: 0.02,
            }),
            opacity: None,
            marker: None,
        };
        let bars = histogram_bars(&trace);
        let counts: Vec<f64> = bars.iter().map(|(_, _, count)| *count).collect();
        assert_eq!(counts, vec![2.0, 2.0]);
    }

    #[test]
    fn three_d_figures_are_rejected() {
        let mut figure = Figure::new("3d");
        figure.push(crate::figure::Scatter3d {
            name: None,
            x: vec![0.0],
            y: vec![0.0],
            z: vec![0.0],
            mode: Mode::Lines,
            line: None,
            surfacecolor: None,
        });
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            render(&figure, &dir.path().join("out.svg")),
            Err(RenderError::Unsupported { .. })
        ));
    }
}
