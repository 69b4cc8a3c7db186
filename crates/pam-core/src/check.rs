//! Drift reports
//!
//! A check reconciles declarations without writing and reports how far each
//! stack file is from its declaration.

use serde::{Deserialize, Serialize};

/// Status of a drift check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// Every entry matches its declaration
    Healthy,
    /// Some declared entries do not exist
    Missing,
    /// Some entries differ from their declaration, are out of position, or
    /// exist while declared absent
    Drifted,
    /// A stack file could not be loaded or reconciled
    Broken,
}

/// An entry that is missing or has drifted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftItem {
    /// The stack file
    pub target: String,
    /// The entry's identity
    pub identity: String,
    /// Human-readable description of the drift
    pub description: String,
}

/// Report from a drift check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// Overall status of the check
    pub status: CheckStatus,
    /// Entries that differ from their declaration
    pub drifted: Vec<DriftItem>,
    /// Declared entries that do not exist
    pub missing: Vec<DriftItem>,
    /// Additional messages about the check
    pub messages: Vec<String>,
}

impl CheckReport {
    /// Create a healthy check report with no issues
    pub fn healthy() -> Self {
        Self {
            status: CheckStatus::Healthy,
            drifted: Vec::new(),
            missing: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Create a check report with missing items
    pub fn with_missing(missing: Vec<DriftItem>) -> Self {
        Self {
            status: CheckStatus::Missing,
            missing,
            ..Self::healthy()
        }
    }

    /// Create a check report with drifted items
    pub fn with_drifted(drifted: Vec<DriftItem>) -> Self {
        Self {
            status: CheckStatus::Drifted,
            drifted,
            ..Self::healthy()
        }
    }

    /// Create a check report for a file that could not be checked
    pub fn broken(message: String) -> Self {
        Self {
            status: CheckStatus::Broken,
            messages: vec![message],
            ..Self::healthy()
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == CheckStatus::Healthy
    }

    /// Merge two check reports, combining their issues
    ///
    /// The resulting status is the "worst" of the two:
    /// Broken > Drifted > Missing > Healthy
    pub fn merge(mut self, other: CheckReport) -> Self {
        self.drifted.extend(other.drifted);
        self.missing.extend(other.missing);
        self.messages.extend(other.messages);

        self.status = match (self.status, other.status) {
            (CheckStatus::Broken, _) | (_, CheckStatus::Broken) => CheckStatus::Broken,
            (CheckStatus::Drifted, _) | (_, CheckStatus::Drifted) => CheckStatus::Drifted,
            (CheckStatus::Missing, _) | (_, CheckStatus::Missing) => CheckStatus::Missing,
            (CheckStatus::Healthy, CheckStatus::Healthy) => CheckStatus::Healthy,
        };

        self
    }
}
