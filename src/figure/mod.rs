//! Chart description shared by every renderer.
//!
//! A [`Figure`] is a plain data model that serializes to the plotly.js
//! figure JSON (`data` + `layout`). It is written either as a standalone
//! interactive HTML document or as a static SVG drawn with `plotters`.

mod error;
mod html;
mod output;
pub mod svg;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::color::Paint;

pub use error::RenderError;
pub use html::{PLOTLY_CDN, PlotlyScript};
pub use output::ChartOutput;

/// On-disk chart formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Interactive plotly.js document.
    Html,
    /// Static vector image.
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" | "plotly" => Ok(OutputFormat::Html),
            "svg" => Ok(OutputFormat::Svg),
            _ => Err(RenderError::UnknownFormat(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                title: Some(Title::new(title)),
                ..Layout::default()
            },
        }
    }

    pub fn title(&self) -> &str {
        self.layout
            .title
            .as_ref()
            .map(|title| title.text.as_str())
            .unwrap_or_default()
    }

    pub fn push(&mut self, trace: impl Into<Trace>) {
        self.data.push(trace.into());
    }

    pub fn annotate(&mut self, annotation: Annotation) {
        self.layout.annotations.push(annotation);
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether any trace needs a 3-D scene.
    pub fn is_3d(&self) -> bool {
        self.data.iter().any(Trace::is_3d)
    }

    /// Check that parallel coordinate arrays agree in length.
    pub fn validate(&self) -> Result<(), RenderError> {
        self.data.iter().try_for_each(Trace::validate)
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Interactive document for this figure, linking plotly.js from the CDN.
    pub fn to_html(&self) -> Result<String, RenderError> {
        html::to_html(self, &PlotlyScript::Cdn)
    }

    /// Interactive document taking plotly.js from `script`.
    pub fn to_html_with(&self, script: &PlotlyScript) -> Result<String, RenderError> {
        html::to_html(self, script)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(Scatter),
    Box(BoxTrace),
    Histogram(Histogram),
    Scatter3d(Scatter3d),
    Mesh3d(Mesh3d),
    Heatmap(Heatmap),
}

impl Trace {
    pub fn name(&self) -> Option<&str> {
        match self {
            Trace::Scatter(trace) => trace.name.as_deref(),
            Trace::Box(trace) => Some(trace.name.as_str()),
            Trace::Histogram(trace) => trace.name.as_deref(),
            Trace::Scatter3d(trace) => trace.name.as_deref(),
            Trace::Mesh3d(trace) => trace.name.as_deref(),
            Trace::Heatmap(_) => None,
        }
    }

    pub fn is_3d(&self) -> bool {
        matches!(self, Trace::Scatter3d(_) | Trace::Mesh3d(_))
    }

    fn validate(&self) -> Result<(), RenderError> {
        let name = || self.name().unwrap_or_default().to_string();
        let check = |expected: usize, found: usize| {
            if expected == found {
                Ok(())
            } else {
                Err(RenderError::LengthMismatch {
                    series: name(),
                    expected,
                    found,
                })
            }
        };
        match self {
            Trace::Scatter(trace) => check(trace.x.len(), trace.y.len()),
            Trace::Scatter3d(trace) => {
                check(trace.x.len(), trace.y.len())?;
                check(trace.x.len(), trace.z.len())
            }
            Trace::Mesh3d(trace) => {
                check(trace.x.len(), trace.y.len())?;
                check(trace.x.len(), trace.z.len())?;
                check(trace.i.len(), trace.j.len())?;
                check(trace.i.len(), trace.k.len())
            }
            Trace::Heatmap(trace) => {
                check(trace.y.len(), trace.z.len())?;
                trace
                    .z
                    .iter()
                    .try_for_each(|row| check(trace.x.len(), row.len()))
            }
            Trace::Box(_) | Trace::Histogram(_) => Ok(()),
        }
    }
}

macro_rules! impl_into_trace {
    ($($kind:ident => $variant:ident),* $(,)?) => {
        $(impl From<$kind> for Trace {
            fn from(trace: $kind) -> Self {
                Trace::$variant(trace)
            }
        })*
    };
}

impl_into_trace!(
    Scatter => Scatter,
    BoxTrace => Box,
    Histogram => Histogram,
    Scatter3d => Scatter3d,
    Mesh3d => Mesh3d,
    Heatmap => Heatmap,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

impl Mode {
    pub fn has_lines(self) -> bool {
        matches!(self, Mode::Lines | Mode::LinesMarkers)
    }

    pub fn has_markers(self) -> bool {
        matches!(self, Mode::Markers | Mode::LinesMarkers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dash {
    Solid,
    Dash,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Paint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<Dash>,
}

impl Line {
    pub fn colored(color: impl Into<Paint>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn dashed(mut self) -> Self {
        self.dash = Some(Dash::Dash);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Paint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl Marker {
    pub fn colored(color: impl Into<Paint>) -> Self {
        Self {
            color: Some(color.into()),
            size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fill {
    #[serde(rename = "toself")]
    ToSelf,
}

/// 2-D line, marker or filled-polygon trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<Paint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textposition: Option<String>,
}

impl Scatter {
    pub fn new(x: Vec<f64>, y: Vec<f64>, mode: Mode) -> Self {
        Self {
            name: None,
            x,
            y,
            mode,
            line: None,
            marker: None,
            fill: None,
            fillcolor: None,
            showlegend: None,
            text: Vec::new(),
            textposition: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn line(mut self, line: Line) -> Self {
        self.line = Some(line);
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Close the path on itself and fill the enclosed area.
    pub fn filled(mut self, color: impl Into<Paint>) -> Self {
        self.fill = Some(Fill::ToSelf);
        self.fillcolor = Some(color.into());
        self
    }

    pub fn text(mut self, text: Vec<String>, position: &str) -> Self {
        self.text = text;
        self.textposition = Some(position.to_string());
        self
    }

    pub fn shows_legend(&self) -> bool {
        self.showlegend.unwrap_or(true) && self.name.is_some()
    }

    /// The trace's stroke or marker color.
    pub fn color(&self) -> Option<Paint> {
        self.line
            .as_ref()
            .and_then(|line| line.color)
            .or_else(|| self.marker.as_ref().and_then(|marker| marker.color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxPoints {
    All,
    Outliers,
    SuspectedOutliers,
}

/// Box-and-whisker trace; quartiles are computed by the viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxTrace {
    pub name: String,
    pub y: Vec<f64>,
    pub whiskerwidth: f64,
    /// Notches mark the confidence interval of the median.
    pub notched: bool,
    /// Also draw the arithmetic mean, which can fall outside the box.
    pub boxmean: bool,
    pub boxpoints: BoxPoints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<Paint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bins {
    pub start: f64,
    pub end: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xbins: Option<Bins>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter3d {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surfacecolor: Option<Paint>,
}

/// Triangle mesh; `i`, `j`, `k` index into the vertex arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mesh3d {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub i: Vec<usize>,
    pub j: Vec<usize>,
    pub k: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Paint>,
    pub opacity: f64,
}

/// Grid of values with categorical axes; `z[row][column]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub z: Vec<Vec<f64>>,
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub colorscale: String,
    pub showscale: bool,
    /// Per-cell label, e.g. `%{z}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texttemplate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Linear,
    Log,
    Category,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AxisType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorange: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtick: Option<f64>,
}

impl Axis {
    pub fn titled(text: impl Into<String>) -> Self {
        Self {
            title: Some(Title::new(text)),
            ..Self::default()
        }
    }

    pub fn log(mut self) -> Self {
        self.kind = Some(AxisType::Log);
        self
    }

    pub fn dtick(mut self, dtick: f64) -> Self {
        self.autorange = Some(true);
        self.showgrid = Some(true);
        self.dtick = Some(dtick);
        self
    }

    pub fn title_text(&self) -> &str {
        self.title
            .as_ref()
            .map(|title| title.text.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub zaxis: Axis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ref {
    /// Data coordinates.
    #[serde(rename = "x")]
    X,
    #[serde(rename = "y")]
    Y,
    /// Fraction of the plotting area.
    Paper,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub family: String,
    pub size: f64,
}

impl Font {
    pub fn arial(size: f64) -> Self {
        Self {
            family: "Arial".to_string(),
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub xref: Ref,
    pub yref: Ref,
    pub x: f64,
    pub y: f64,
    pub xanchor: String,
    pub yanchor: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    pub showarrow: bool,
}

impl Annotation {
    /// Text anchored left-middle at data coordinates.
    pub fn at_data(x: f64, y: f64, text: impl Into<String>, font: Font) -> Self {
        Self {
            xref: Ref::X,
            yref: Ref::Y,
            x,
            y,
            xanchor: "left".to_string(),
            yanchor: "middle".to_string(),
            text: text.into(),
            font: Some(font),
            showarrow: false,
        }
    }

    /// Text at a fraction of the plot width and a data `y`.
    pub fn at_paper_x(x: f64, y: f64, text: impl Into<String>, font: Font) -> Self {
        Self {
            xref: Ref::Paper,
            ..Self::at_data(x, y, text, font)
        }
    }

    /// Free text in paper coordinates, e.g. a chart-wide note.
    pub fn note(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            xref: Ref::Paper,
            yref: Ref::Paper,
            x,
            y,
            xanchor: "left".to_string(),
            yanchor: "bottom".to_string(),
            text: text.into(),
            font: None,
            showarrow: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    Overlay,
    Group,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<Scene>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<BarMode>,
}

#[cfg(test)]
mod tests;
