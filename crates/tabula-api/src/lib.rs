//! Tabula API crate - axum HTTP server and route handlers.
//!
//! Provides the REST API for the engine: dataset upload and analysis, chat
//! queries against sessions, session cleanup, and health checks.

pub mod error;
pub mod handlers;
pub mod ingest;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
