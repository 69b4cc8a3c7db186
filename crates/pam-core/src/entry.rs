//! Declared stack entries

use std::fmt;
use std::str::FromStr;

use pam_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::{Error, Result};

/// Stack category an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Auth,
    Account,
    Password,
    Session,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Account => "account",
            Self::Password => "password",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "account" => Ok(Self::Account),
            "password" => Ok(Self::Password),
            "session" => Ok(Self::Session),
            other => Err(Error::invalid_declaration(format!(
                "unknown type '{other}', expected auth, account, password or session"
            ))),
        }
    }
}

/// Desired state of an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Exists with the declared fields
    #[default]
    Present,
    /// Does not exist
    Absent,
    /// Exists with the declared fields, at the declared position
    Positioned,
}

/// The desired state of one stack entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredEntry {
    /// Required for the combined file, ignored otherwise
    pub service: Option<String>,
    pub phase: Phase,
    /// Control flag; opaque text, bracketed expressions included
    pub control: String,
    /// Whether `control` is part of the entry's identity
    pub control_is_param: bool,
    pub module: String,
    /// Module arguments; order is significant
    pub arguments: Vec<String>,
    /// Rendered as a leading `-` on the type
    pub optional: bool,
    pub position: Option<Position>,
    pub presence: Presence,
    /// Explicit stack file; resolved from `service` when unset
    pub target: Option<NormalizedPath>,
}

impl DeclaredEntry {
    pub fn new(phase: Phase, control: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            service: None,
            phase,
            control: control.into(),
            control_is_param: false,
            module: module.into(),
            arguments: Vec::new(),
            optional: false,
            position: None,
            presence: Presence::Present,
            target: None,
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_control_is_param(mut self, control_is_param: bool) -> Self {
        self.control_is_param = control_is_param;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_target(mut self, target: impl Into<NormalizedPath>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Identity used to match this entry against a file
    pub fn identity(&self, combined: bool) -> Identity {
        Identity {
            service: self.service.clone().filter(|_| combined),
            phase: self.phase,
            module: self.module.clone(),
            control: self.control_is_param.then(|| self.control.clone()),
        }
    }

    /// Check the invariants every reconciliation relies on.
    pub fn validate(&self) -> Result<()> {
        if self.module.trim().is_empty() {
            return Err(Error::invalid_declaration("module must not be empty"));
        }
        if self.control.trim().is_empty() {
            return Err(Error::invalid_declaration(format!(
                "control of {} must not be empty",
                self.module
            )));
        }
        if self.presence == Presence::Positioned && self.position.is_none() {
            return Err(Error::invalid_declaration(format!(
                "{} {} is declared positioned without a position",
                self.phase, self.module
            )));
        }
        if let Some(service) = &self.service
            && (service.is_empty()
                || service.contains('/')
                || service == "."
                || service == "..")
        {
            return Err(Error::invalid_declaration(format!(
                "invalid service name '{service}'"
            )));
        }
        Ok(())
    }
}

/// The fields that decide which node an entry corresponds to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Only set for the combined file
    pub service: Option<String>,
    pub phase: Phase,
    pub module: String,
    /// Only set when the control is part of the identity
    pub control: Option<String>,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(service) = &self.service {
            write!(f, "{service} ")?;
        }
        write!(f, "{}", self.phase)?;
        if let Some(control) = &self.control {
            write!(f, " {control}")?;
        }
        write!(f, " {}", self.module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_phase_parses_case_insensitively() {
        assert_eq!("AUTH".parse::<Phase>().unwrap(), Phase::Auth);
        assert_eq!("session".parse::<Phase>().unwrap(), Phase::Session);
        assert!("authz".parse::<Phase>().is_err());
    }

    #[test]
    fn test_identity_includes_control_only_when_param() {
        let entry = DeclaredEntry::new(Phase::Password, "requisite", "pam_pwquality.so")
            .with_service("sshd");
        assert_eq!(entry.identity(false).to_string(), "password pam_pwquality.so");
        assert_eq!(
            entry.clone().with_control_is_param(true).identity(true).to_string(),
            "sshd password requisite pam_pwquality.so"
        );
    }

    #[test]
    fn test_positioned_requires_position() {
        let entry = DeclaredEntry::new(Phase::Auth, "required", "pam_env.so")
            .with_presence(Presence::Positioned);
        assert!(matches!(
            entry.validate(),
            Err(Error::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_empty_module_is_rejected() {
        let entry = DeclaredEntry::new(Phase::Auth, "required", " ");
        assert!(entry.validate().is_err());
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("../shadow")]
    fn test_service_names_outside_pam_dir_are_rejected(#[case] service: &str) {
        let entry = DeclaredEntry::new(Phase::Auth, "required", "pam_env.so").with_service(service);
        assert!(matches!(
            entry.validate(),
            Err(Error::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_dotted_service_name_is_accepted() {
        let entry =
            DeclaredEntry::new(Phase::Auth, "required", "pam_env.so").with_service("sshd.local");
        assert!(entry.validate().is_ok());
    }
}
