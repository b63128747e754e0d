use std::path::{Path, PathBuf};

use super::{Figure, OutputFormat, PlotlyScript, RenderError, svg};
use crate::config::ReportConfig;

/// Where and how rendered figures are written.
///
/// `save` writes every format under the target directory. `open` launches the
/// HTML document in the system viewer; without `save` it is written to the
/// temporary directory first.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOutput {
    pub formats: Vec<OutputFormat>,
    pub save: bool,
    pub open: bool,
    pub plotly: PlotlyScript,
}

impl Default for ChartOutput {
    fn default() -> Self {
        Self::new(vec![OutputFormat::Html, OutputFormat::Svg])
    }
}

impl ChartOutput {
    pub fn new(formats: Vec<OutputFormat>) -> Self {
        Self {
            formats,
            save: true,
            open: false,
            plotly: PlotlyScript::Cdn,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        let output = Self::new(config.output_formats());
        match &config.plotly_js {
            Some(path) => output.with_plotly(PlotlyScript::Bundle(path.clone())),
            None => output,
        }
    }

    pub fn with_plotly(mut self, plotly: PlotlyScript) -> Self {
        self.plotly = plotly;
        self
    }

    pub fn opening(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    pub fn saving(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    /// Only the formats that can hold `figure`; 3-D figures are HTML only.
    fn formats_for(&self, figure: &Figure) -> Vec<OutputFormat> {
        self.formats
            .iter()
            .copied()
            .filter(|format| {
                let supported = !(figure.is_3d() && *format == OutputFormat::Svg);
                if !supported {
                    tracing::warn!(
                        "Skipping SVG output of {:?}: 3-D charts are written as HTML only",
                        figure.title()
                    );
                }
                supported
            })
            .collect()
    }

    /// Write `figure` as `<dir>/<stem>.<ext>` for each format.
    ///
    /// Returns the written paths. An empty figure is logged and nothing is
    /// written.
    pub fn write(
        &self,
        figure: &Figure,
        dir: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>, RenderError> {
        if figure.is_empty() {
            tracing::warn!("Nothing to plot for {:?}", figure.title());
            return Ok(Vec::new());
        }
        figure.validate()?;
        let mut written = Vec::new();
        if self.save {
            std::fs::create_dir_all(dir).map_err(|source| RenderError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            for format in self.formats_for(figure) {
                let path = dir.join(format!("{stem}.{}", format.extension()));
                write_format(figure, format, &path, &self.plotly)?;
                tracing::info!("Saved {}", path.display());
                written.push(path);
            }
        }
        if self.open {
            let target = match written.iter().find(|path| has_extension(path, "html")) {
                Some(path) => path.clone(),
                None => {
                    let path = std::env::temp_dir().join(format!("{stem}.html"));
                    write_format(figure, OutputFormat::Html, &path, &self.plotly)?;
                    path
                }
            };
            open::that(&target).map_err(|source| RenderError::Open {
                path: target.clone(),
                source,
            })?;
        }
        Ok(written)
    }
}

fn write_format(
    figure: &Figure,
    format: OutputFormat,
    path: &Path,
    plotly: &PlotlyScript,
) -> Result<(), RenderError> {
    match format {
        OutputFormat::Html => {
            let html = figure.to_html_with(plotly)?;
            std::fs::write(path, html).map_err(|source| RenderError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
        OutputFormat::Svg => svg::render(figure, path),
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(extension)
}
