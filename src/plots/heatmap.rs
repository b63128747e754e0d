use crate::confusion::ConfusionMatrix;
use crate::figure::{Axis, AxisType, Figure, Heatmap};

/// Annotated heatmap of a confusion matrix, margins included.
///
/// Rows are the actual classes and columns the predicted ones.
pub fn confusion_figure(matrix: &ConfusionMatrix, title: &str) -> Figure {
    let z = matrix.values().rows().into_iter().map(|row| row.to_vec()).collect();
    let mut figure = Figure::new(title);
    figure.push(Heatmap {
        z,
        x: matrix.columns().to_vec(),
        y: matrix.rows().to_vec(),
        colorscale: "Blues".to_string(),
        showscale: true,
        texttemplate: Some("%{z}".to_string()),
    });
    let categorical = |title: &str| Axis {
        kind: Some(AxisType::Category),
        ..Axis::titled(title)
    };
    figure.layout.xaxis = Some(categorical("Predicted"));
    figure.layout.yaxis = Some(categorical("Actual"));
    figure
}
