//! Filesystem helpers for PAM stack reconciliation
//!
//! Provides normalized target paths, the well-known PAM locations, locked
//! atomic writes, and format-agnostic loading of declaration documents.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::PamPath;
pub use error::{Error, Result};
pub use path::NormalizedPath;
