pub mod config;
pub mod error;
pub mod table;
pub mod types;

pub use config::TabulaConfig;
pub use error::{Result, TabulaError};
pub use table::{Column, DataTable};
pub use types::*;
