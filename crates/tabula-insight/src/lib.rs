//! Insight generation: deterministic statistics, significance tests, and an
//! optional LLM narrative layer, attached per chart.

pub mod generator;
pub mod narrative;
pub mod significance;
pub mod stats;

pub use generator::InsightGenerator;
