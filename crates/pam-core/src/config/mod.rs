//! Configuration: where stack files live, and declaration documents
//!
//! - [`PamConfig`]: the PAM directory, combined file, and default target
//! - [`Manifest`]: a document of `[[entry]]` declarations

mod manifest;

pub use manifest::{Arguments, Declaration, Manifest};

use std::path::{Path, PathBuf};

use pam_fs::{ConfigStore, NormalizedPath, PamPath};
use pam_tree::Grammar;
use serde::{Deserialize, Serialize};

use crate::entry::DeclaredEntry;
use crate::{Error, Result};

/// Locations of the stack files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PamConfig {
    /// Directory holding one stack file per service
    pub pam_dir: PathBuf,
    /// The combined multi-service file
    pub combined_file: PathBuf,
    /// Target when an entry names neither a target nor a service
    pub default_target: PathBuf,
}

impl Default for PamConfig {
    fn default() -> Self {
        Self {
            pam_dir: PamPath::ServiceDir.as_ref().to_path_buf(),
            combined_file: PamPath::CombinedFile.as_ref().to_path_buf(),
            default_target: PamPath::DefaultTarget.as_ref().to_path_buf(),
        }
    }
}

impl PamConfig {
    /// The standard layout relocated under `root`
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            pam_dir: root.join("pam.d"),
            combined_file: root.join("pam.conf"),
            default_target: root.join("pam.d").join("system-auth"),
        }
    }

    /// Load a configuration file (TOML, JSON or YAML).
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    pub fn combined_file(&self) -> NormalizedPath {
        NormalizedPath::new(&self.combined_file)
    }

    /// Stack file for an explicit target or a service name
    pub fn resolve_target(
        &self,
        target: Option<&NormalizedPath>,
        service: Option<&str>,
    ) -> NormalizedPath {
        match (target, service) {
            (Some(target), _) => target.clone(),
            (None, Some(service)) => NormalizedPath::new(&self.pam_dir).join(service),
            (None, None) => NormalizedPath::new(&self.default_target),
        }
    }

    /// Stack file an entry applies to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDeclaration`] for a combined-file entry
    /// without a service.
    pub fn target_for(&self, entry: &DeclaredEntry) -> Result<NormalizedPath> {
        let target = self.resolve_target(entry.target.as_ref(), entry.service.as_deref());
        if self.is_combined(&target) && entry.service.is_none() {
            return Err(Error::invalid_declaration(format!(
                "{} {} targets {} and needs a service",
                entry.phase, entry.module, target
            )));
        }
        Ok(target)
    }

    pub fn is_combined(&self, target: &NormalizedPath) -> bool {
        *target == self.combined_file()
    }

    pub fn grammar_for(&self, target: &NormalizedPath) -> Grammar {
        Grammar::for_target(target, &self.combined_file())
    }
}
