use std::path::{Path, PathBuf};

use super::{Figure, RenderError};

/// plotly.js bundle linked by generated documents unless a local bundle is
/// configured. Viewing such a document needs network access.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Where a document gets plotly.js from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlotlyScript {
    /// Linked from [`PLOTLY_CDN`].
    #[default]
    Cdn,
    /// Contents of a local `plotly.min.js` embedded in the document, so it
    /// opens offline.
    Bundle(PathBuf),
}

impl PlotlyScript {
    fn tag(&self) -> Result<String, RenderError> {
        match self {
            PlotlyScript::Cdn => Ok(format!(r#"<script src="{PLOTLY_CDN}"></script>"#)),
            PlotlyScript::Bundle(path) => {
                let source = read_bundle(path)?;
                Ok(format!("<script>{}</script>", source.replace("</script", "<\\/script")))
            }
        }
    }
}

fn read_bundle(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|source| RenderError::ReadBundle {
        path: path.to_path_buf(),
        source,
    })
}

const PLOT_CONFIG: &str = r#"{"scrollZoom": true, "editable": true, "responsive": true}"#;

pub(super) fn to_html(figure: &Figure, script: &PlotlyScript) -> Result<String, RenderError> {
    // `</script>` inside a string value would end the script block early.
    let json = figure.to_json()?.replace("</", "<\\/");
    let script = script.tag()?;
    let title = escape_text(figure.title());
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
{script}
</head>
<body>
<div id="figure" style="width:100%;height:100vh;"></div>
<script>
const figure = {json};
Plotly.newPlot("figure", figure.data, figure.layout, {PLOT_CONFIG});
</script>
</body>
</html>
"#
    ))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
