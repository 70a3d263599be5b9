//! Chart rendering seam.
//!
//! The engine describes what to draw with [`ChartSpec`]; a [`ChartBackend`]
//! turns that into an opaque render payload. The built-in [`PlotlyBackend`]
//! emits plotly-style JSON and is fully deterministic.

use serde_json::{json, Value};

/// A renderer-agnostic chart description built from aggregated data only.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Histogram {
        title: String,
        column: String,
        values: Vec<f64>,
        bins: usize,
    },
    Donut {
        title: String,
        labels: Vec<String>,
        values: Vec<u64>,
    },
    Bar {
        title: String,
        x_title: String,
        y_title: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Heatmap {
        title: String,
        axis: Vec<String>,
        matrix: Vec<Vec<f64>>,
    },
}

pub trait ChartBackend: Send + Sync {
    fn render(&self, spec: &ChartSpec) -> Value;
}

/// Deterministic plotly-JSON backend.
pub struct PlotlyBackend;

impl ChartBackend for PlotlyBackend {
    fn render(&self, spec: &ChartSpec) -> Value {
        match spec {
            ChartSpec::Histogram {
                title,
                column,
                values,
                bins,
            } => json!({
                "data": [{
                    "type": "histogram",
                    "x": values,
                    "nbinsx": bins,
                    "marker": {"color": "#636efa"}
                }],
                "layout": {
                    "title": title,
                    "xaxis": {"title": column},
                    "yaxis": {"title": "Count"},
                    "height": 400
                }
            }),
            ChartSpec::Donut {
                title,
                labels,
                values,
            } => json!({
                "data": [{
                    "type": "pie",
                    "labels": labels,
                    "values": values,
                    "hole": 0.4
                }],
                "layout": {
                    "title": title,
                    "height": 400
                }
            }),
            ChartSpec::Bar {
                title,
                x_title,
                y_title,
                labels,
                values,
            } => json!({
                "data": [{
                    "type": "bar",
                    "x": labels,
                    "y": values,
                    "marker": {"color": "#636efa"}
                }],
                "layout": {
                    "title": title,
                    "xaxis": {"title": x_title},
                    "yaxis": {"title": y_title},
                    "height": 400
                }
            }),
            ChartSpec::Heatmap {
                title,
                axis,
                matrix,
            } => json!({
                "data": [{
                    "type": "heatmap",
                    "z": matrix,
                    "x": axis,
                    "y": axis,
                    "colorscale": "RdBu",
                    "zmin": -1,
                    "zmax": 1
                }],
                "layout": {
                    "title": title,
                    "height": 500
                }
            }),
        }
    }
}
