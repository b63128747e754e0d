use serde_json::{Value, json};
use tempfile::tempdir;

use super::*;
use crate::color::Rgb;
use crate::config::ReportConfig;

fn line_figure() -> Figure {
    let mut figure = Figure::new("train loss");
    figure.push(
        Scatter::new(vec![0.0, 1.0, 2.0], vec![1.0, f64::NAN, 0.5], Mode::Lines)
            .named("net </script>")
            .line(Line::colored(Rgb::new(31, 119, 180))),
    );
    figure.layout.xaxis = Some(Axis::titled("steps"));
    figure
}

#[test]
fn output_formats_parse_known_names() {
    assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
    assert_eq!("Plotly".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
    assert_eq!("svg".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
    assert!(matches!(
        "matplotlib".parse::<OutputFormat>(),
        Err(RenderError::UnknownFormat(name)) if name == "matplotlib"
    ));
}

#[test]
fn figure_serializes_to_plotly_json() {
    let value: Value = serde_json::from_str(&line_figure().to_json().unwrap()).unwrap();
    assert_eq!(value["layout"]["title"], json!({"text": "train loss"}));
    assert_eq!(value["layout"]["xaxis"]["title"]["text"], "steps");
    let trace = &value["data"][0];
    assert_eq!(trace["type"], "scatter");
    assert_eq!(trace["mode"], "lines");
    assert_eq!(trace["line"]["color"], "rgb(31, 119, 180)");
    assert_eq!(trace["y"], json!([1.0, null, 0.5]));
    assert!(trace.get("fill").is_none());
}

#[test]
fn box_and_mesh_traces_use_plotly_names() {
    let mut figure = Figure::new("boxes");
    figure.push(BoxTrace {
        name: "A".to_string(),
        y: vec![0.1, 0.2],
        whiskerwidth: 0.2,
        notched: true,
        boxmean: true,
        boxpoints: BoxPoints::SuspectedOutliers,
        fillcolor: Some(Rgb::new(31, 119, 180).with_alpha(0.5).into()),
        line: None,
    });
    let value: Value = serde_json::from_str(&figure.to_json().unwrap()).unwrap();
    assert_eq!(value["data"][0]["type"], "box");
    assert_eq!(value["data"][0]["boxpoints"], "suspectedoutliers");
    assert_eq!(value["data"][0]["fillcolor"], "rgba(31, 119, 180, 0.5)");
}

#[test]
fn html_embeds_figure_without_closing_script_early() {
    let html = line_figure().to_html().unwrap();
    assert!(html.contains(PLOTLY_CDN));
    assert!(html.contains("\"scrollZoom\": true"));
    assert!(html.contains("net <\\/script>"));
    assert_eq!(html.matches("</script>").count(), 2);
}

#[test]
fn local_plotly_bundle_is_embedded() {
    let dir = tempdir().unwrap();
    let bundle = dir.path().join("plotly.min.js");
    std::fs::write(&bundle, "window.Plotly = {}; // </script> inside").unwrap();

    let html = line_figure()
        .to_html_with(&PlotlyScript::Bundle(bundle.clone()))
        .unwrap();
    assert!(!html.contains(PLOTLY_CDN));
    assert!(html.contains("window.Plotly = {};"));
    assert_eq!(html.matches("</script>").count(), 2);

    let config = ReportConfig {
        plotly_js: Some(bundle.clone()),
        ..ReportConfig::default()
    };
    let output = ChartOutput::from_config(&config);
    assert_eq!(output.plotly, PlotlyScript::Bundle(bundle));
    let written = output.write(&line_figure(), dir.path(), "loss").unwrap();
    let saved = std::fs::read_to_string(&written[0]).unwrap();
    assert!(saved.contains("window.Plotly = {};"));
}

#[test]
fn missing_plotly_bundle_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.js");
    assert!(matches!(
        line_figure().to_html_with(&PlotlyScript::Bundle(missing)),
        Err(RenderError::ReadBundle { .. })
    ));
}

#[test]
fn mismatched_coordinates_fail_validation() {
    let mut figure = Figure::new("bad");
    figure.push(Scatter::new(vec![0.0, 1.0], vec![1.0], Mode::Markers).named("short"));
    assert!(matches!(
        figure.validate(),
        Err(RenderError::LengthMismatch { expected: 2, found: 1, .. })
    ));
}

#[test]
fn chart_output_writes_each_format() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("plots").join("lines");
    let written = ChartOutput::default()
        .write(&line_figure(), &target, "loss")
        .unwrap();
    assert_eq!(written, vec![target.join("loss.html"), target.join("loss.svg")]);
    assert!(written.iter().all(|path| path.is_file()));
}

#[test]
fn three_d_charts_are_written_as_html_only() {
    let dir = tempdir().unwrap();
    let mut figure = Figure::new("3d");
    figure.push(Scatter3d {
        name: Some("A; step: 1".to_string()),
        x: vec![1.0, 1.0],
        y: vec![0.0, 0.0],
        z: vec![0.0, 1.0],
        mode: Mode::Lines,
        line: None,
        surfacecolor: None,
    });
    let written = ChartOutput::default().write(&figure, dir.path(), "hist").unwrap();
    assert_eq!(written, vec![dir.path().join("hist.html")]);
}

#[test]
fn empty_figures_write_nothing() {
    let dir = tempdir().unwrap();
    let written = ChartOutput::default()
        .write(&Figure::new("empty"), dir.path(), "empty")
        .unwrap();
    assert!(written.is_empty());
    assert!(!dir.path().join("empty.html").exists());
}
