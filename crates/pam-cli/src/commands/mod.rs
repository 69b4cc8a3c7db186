//! Command implementations for pam-cli

pub mod apply;
pub mod check;
pub mod list;

pub use apply::run_apply;
pub use check::run_check;
pub use list::run_list;

use std::path::Path;

use pam_core::{DeclaredEntry, Manifest, PamConfig};
use pam_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// Load the PAM locations, falling back to the standard `/etc` layout.
pub fn load_config(path: Option<&Path>) -> Result<PamConfig> {
    match path {
        Some(path) => Ok(PamConfig::load(&NormalizedPath::new(path))?),
        None => Ok(PamConfig::default()),
    }
}

/// Load and validate every declaration of a manifest.
pub(crate) fn load_entries(path: &Path) -> Result<Vec<DeclaredEntry>> {
    let manifest_path = NormalizedPath::new(path);
    if !manifest_path.is_file() {
        return Err(CliError::user(format!("Manifest not found: {manifest_path}")));
    }
    let entries = Manifest::load(&manifest_path)?.into_entries()?;
    tracing::debug!(manifest = %manifest_path, entries = entries.len(), "loaded manifest");
    Ok(entries)
}
