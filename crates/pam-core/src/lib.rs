//! Reconciliation core for PAM stack files
//!
//! Takes declared stack entries and brings a stack file in line with them,
//! one transaction per entry:
//!
//! - **Position resolution**: `before module pam_deny.so` style directives
//!   become anchor steps and a placement
//! - **Entry location**: an entry's identity becomes the step that selects
//!   its node(s)
//! - **Reconciliation**: create, update, remove, and reposition entries
//!   through a [`pam_tree::TreeEditor`]
//! - **Enumeration**: materialize every entry of a stack file
//!
//! # Architecture
//!
//! ```text
//!                  pamstack (CLI)
//!                        |
//!                    pam-core
//!                        |
//!              +---------+---------+
//!              |                   |
//!           pam-tree            pam-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pam_core::{ApplyOptions, DeclaredEntry, PamConfig, Phase, Position, StackEngine};
//!
//! fn example() -> pam_core::Result<()> {
//!     let entry = DeclaredEntry::new(Phase::Auth, "sufficient", "pam_sss.so")
//!         .with_arguments(["use_first_pass"])
//!         .with_position("before module pam_deny.so".parse::<Position>()?);
//!
//!     let engine = StackEngine::new(PamConfig::default());
//!     let reports = engine.apply(&[entry], &ApplyOptions::default())?;
//!     println!("{}", reports[0].outcome);
//!     Ok(())
//! }
//! ```

pub mod check;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod position;
pub mod reconcile;

pub use check::{CheckReport, CheckStatus, DriftItem};
pub use config::{Declaration, Manifest, PamConfig};
pub use engine::{ApplyOptions, ReconcileReport, StackEngine};
pub use entry::{DeclaredEntry, Identity, Phase, Presence};
pub use error::{Error, Result};
pub use position::{Alias, Anchor, Placement, Position};
pub use reconcile::{
    Change, FieldValue, Instance, Instances, Outcome, Reconciled, Reconciler, enumerate, locate,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_error_names_target() {
        let error = Error::Load {
            path: PathBuf::from("/etc/pam.d/system-auth"),
            line: 4,
            message: "unknown type 'bogus'".into(),
        };

        let display = error.to_string();
        assert!(
            display.contains("/etc/pam.d/system-auth"),
            "Error display should contain the path, got: {}",
            display
        );
        assert!(display.contains("line 4"), "got: {}", display);
    }
}
