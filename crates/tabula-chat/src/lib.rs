//! Chat query routing: intent classification, column resolution, local
//! aggregates, and LLM delegation.

pub mod aggregate;
pub mod columns;
pub mod intent;
pub mod router;

pub use intent::{IntentClassifier, QueryIntent};
pub use router::QueryRouter;
