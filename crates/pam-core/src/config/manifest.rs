//! Declaration documents
//!
//! A manifest lists entries as `[[entry]]` tables:
//!
//! ```toml
//! [[entry]]
//! service = "system-auth"
//! type = "auth"
//! control = "sufficient"
//! module = "pam_sss.so"
//! arguments = ["use_first_pass"]
//! position = "before module pam_deny.so"
//! ```

use std::path::PathBuf;

use pam_fs::{ConfigStore, NormalizedPath};
use pam_tree::grammar::tokenize;
use serde::{Deserialize, Serialize};

use crate::entry::{DeclaredEntry, Phase, Presence};
use crate::position::Position;
use crate::{Error, Result};

/// Module arguments as written: one whitespace-separated line or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arguments {
    Line(String),
    List(Vec<String>),
}

impl Default for Arguments {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl Arguments {
    /// A line splits the way a stack file does: on whitespace, with
    /// `[...]` groups kept whole.
    pub fn into_vec(self) -> Result<Vec<String>> {
        match self {
            Self::Line(line) => tokenize(&line).map_err(|message| {
                Error::invalid_declaration(format!("arguments '{line}': {message}"))
            }),
            Self::List(list) => Ok(list),
        }
    }
}

/// One entry as written in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(rename = "type")]
    pub phase: Phase,
    pub control: String,
    #[serde(default)]
    pub control_is_param: bool,
    pub module: String,
    #[serde(default)]
    pub arguments: Arguments,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub ensure: Presence,
    #[serde(default)]
    pub target: Option<PathBuf>,
}

impl Declaration {
    /// Validate into a [`DeclaredEntry`], parsing the position directive.
    pub fn into_entry(self) -> Result<DeclaredEntry> {
        let entry = DeclaredEntry {
            service: self.service,
            phase: self.phase,
            control: self.control,
            control_is_param: self.control_is_param,
            module: self.module,
            arguments: self.arguments.into_vec()?,
            optional: self.optional,
            position: self.position.as_deref().map(Position::parse).transpose()?,
            presence: self.ensure,
            target: self.target.map(NormalizedPath::from),
        };
        entry.validate()?;
        Ok(entry)
    }
}

/// A declaration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(rename = "entry", default)]
    pub entries: Vec<Declaration>,
}

impl Manifest {
    /// Parse a manifest from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use pam_core::config::Manifest;
    ///
    /// let manifest = Manifest::parse(r#"
    /// [[entry]]
    /// type = "password"
    /// control = "requisite"
    /// module = "pam_pwquality.so"
    /// arguments = "try_first_pass retry=3"
    /// "#).unwrap();
    ///
    /// assert_eq!(manifest.entries.len(), 1);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a manifest file; the format follows the extension.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    /// Validate every declaration, in document order.
    pub fn into_entries(self) -> Result<Vec<DeclaredEntry>> {
        self.entries
            .into_iter()
            .map(Declaration::into_entry)
            .collect()
    }
}
