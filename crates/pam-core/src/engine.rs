//! StackEngine: one transaction per declared entry
//!
//! For each entry the engine resolves the target file, opens a session on
//! it, reconciles, and then commits (or, on a dry run or any error,
//! discards). A failed entry stops the run; entries already committed
//! stay committed.

use pam_fs::NormalizedPath;
use pam_tree::Session;
use serde::{Deserialize, Serialize};

use crate::check::{CheckReport, DriftItem};
use crate::config::PamConfig;
use crate::entry::DeclaredEntry;
use crate::reconcile::{Change, Instance, Outcome, Reconciler, enumerate};
use crate::{Error, Result};

/// Options for apply and check operations
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// If true, reconcile and report without writing
    pub dry_run: bool,
}

/// What reconciling one entry did to its target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub target: String,
    pub identity: String,
    pub outcome: Outcome,
    /// False when the declared anchor matched nothing and the entry was
    /// appended instead
    pub anchored: bool,
    /// Fields rewritten on an existing entry
    pub changes: Vec<Change>,
    /// Tree mutations recorded
    pub mutations: usize,
    /// Unified diff of the file, empty when nothing changed
    pub diff: String,
    pub dry_run: bool,
}

impl ReconcileReport {
    pub fn is_change(&self) -> bool {
        self.outcome != Outcome::Unchanged
    }

    /// One-line description for humans
    pub fn action(&self) -> String {
        let prefix = if self.dry_run && self.is_change() {
            "[dry-run] would be "
        } else {
            ""
        };
        let mut action = format!(
            "{prefix}{} {} in {}",
            self.outcome, self.identity, self.target
        );
        if !self.anchored {
            action.push_str(" (anchor not found, appended)");
        }
        action
    }
}

/// Engine reconciling declared entries against stack files
#[derive(Debug, Clone, Default)]
pub struct StackEngine {
    config: PamConfig,
}

impl StackEngine {
    pub fn new(config: PamConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PamConfig {
        &self.config
    }

    /// Reconcile one entry in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] when the target does not parse, and
    /// [`Error::Transaction`] or [`Error::IdentityConflict`] when
    /// reconciliation fails; the target is left untouched in every case.
    pub fn reconcile(&self, entry: &DeclaredEntry, options: &ApplyOptions) -> Result<ReconcileReport> {
        entry.validate()?;
        let target = self.config.target_for(entry)?;
        let grammar = self.config.grammar_for(&target);
        let combined = grammar.has_service();

        let mut session = Session::open(&target, grammar)
            .map_err(|e| Error::from(e).in_transaction(target.to_native()))?;

        let result = Reconciler::new(&mut session, grammar, target.to_native()).reconcile(entry);
        let reconciled = match result {
            Ok(reconciled) => reconciled,
            Err(e) => {
                session.discard();
                return Err(e.in_transaction(target.to_native()));
            }
        };

        let diff = session
            .diff()
            .map_err(|e| Error::from(e).in_transaction(target.to_native()))?;
        let mutations = session.edits().len();

        if options.dry_run {
            let discarded = session.discard();
            if discarded > 0 {
                tracing::info!(path = %target, mutations = discarded, "dry run, discarded changes");
            }
        } else {
            session
                .commit()
                .map_err(|e| Error::from(e).in_transaction(target.to_native()))?;
        }

        let report = ReconcileReport {
            target: target.to_string(),
            identity: entry.identity(combined).to_string(),
            outcome: reconciled.outcome,
            anchored: reconciled.anchored,
            changes: reconciled.changes,
            mutations,
            diff: diff.unified,
            dry_run: options.dry_run,
        };
        if report.is_change() {
            tracing::info!(
                path = %report.target,
                identity = %report.identity,
                outcome = %report.outcome,
                mutations,
                "reconciled entry"
            );
        }
        Ok(report)
    }

    /// Reconcile `entries` in order, stopping at the first error.
    pub fn apply(&self, entries: &[DeclaredEntry], options: &ApplyOptions) -> Result<Vec<ReconcileReport>> {
        entries
            .iter()
            .map(|entry| self.reconcile(entry, options))
            .collect()
    }

    /// Report drift between `entries` and their targets without writing.
    pub fn check(&self, entries: &[DeclaredEntry]) -> CheckReport {
        let options = ApplyOptions { dry_run: true };
        entries
            .iter()
            .map(|entry| match self.reconcile(entry, &options) {
                Ok(report) => Self::check_report(report),
                Err(e) => CheckReport::broken(e.to_string()),
            })
            .fold(CheckReport::healthy(), CheckReport::merge)
    }

    fn check_report(report: ReconcileReport) -> CheckReport {
        let description = match report.outcome {
            Outcome::Unchanged => return CheckReport::healthy(),
            Outcome::Created => {
                return CheckReport::with_missing(vec![DriftItem {
                    target: report.target,
                    identity: report.identity,
                    description: "not present".to_string(),
                }]);
            }
            Outcome::Updated => report
                .changes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            Outcome::Repositioned => "out of position".to_string(),
            Outcome::Removed => "present but declared absent".to_string(),
        };
        CheckReport::with_drifted(vec![DriftItem {
            target: report.target,
            identity: report.identity,
            description,
        }])
    }

    /// Every entry currently in `target`
    pub fn instances(&self, target: &NormalizedPath) -> Result<Vec<Instance>> {
        let grammar = self.config.grammar_for(target);
        let session = Session::open(target, grammar)
            .map_err(|e| Error::from(e).in_transaction(target.to_native()))?;
        let instances = enumerate(&session, grammar)?.collect::<Result<Vec<_>>>()?;
        session.discard();
        Ok(instances)
    }
}
