//! loro-core: shared configuration, error types, and typed tool documents
//!
//! Every persisted document in loro is a plain serde record whose fields all
//! carry defaults, so a partially written or older document still loads.

pub mod config;
pub mod error;
pub mod types;

pub use config::LoroConfig;
pub use error::{LoroError, LoroResult};
