//! In-memory session store: one uploaded table, its immutable analysis
//! artifacts, and a serialized conversation log per session.

pub mod store;

pub use store::{Session, SessionStore};
