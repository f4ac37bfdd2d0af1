//! meshport core library
//!
//! This crate provides the in-memory scene that an import populates and an
//! export serialises, the conversion configuration, and the error type
//! shared across all meshport components.

pub mod config;
pub mod error;
pub mod types;

pub use config::ConvertConfig;
pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::config::ConvertConfig;
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
