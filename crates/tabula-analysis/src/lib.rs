//! Analysis pipeline: dtype inference, profiling, health scoring, summary
//! text, and the chart battery.

pub mod backend;
pub mod charts;
pub mod dtype;
pub mod pipeline;
pub mod profile;
pub mod summary;

pub use backend::{ChartBackend, ChartSpec, PlotlyBackend};
pub use pipeline::Analyzer;
