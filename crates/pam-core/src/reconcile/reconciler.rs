//! The reconciler: a small state machine over the nodes an entry matches
//!
//! | matches | presence     | action                                        |
//! |---------|--------------|-----------------------------------------------|
//! | 0       | present      | create                                        |
//! | 0       | positioned   | create at the position                        |
//! | 1       | present      | diff fields                                   |
//! | 1+      | positioned   | out of position: remove and create; else diff |
//! | 2+      | present      | identity conflict                             |
//! | any     | absent       | remove every match                            |

use std::fmt;
use std::path::PathBuf;

use pam_tree::grammar::fields;
use pam_tree::{Expr, Grammar, NodePath, Query, Step, TreeEditor};
use serde::{Deserialize, Serialize};

use super::fields::{FIELDS, append_arguments};
use super::locator::locate;
use crate::entry::{DeclaredEntry, Presence};
use crate::position::Placement;
use crate::{Error, Result};

/// What reconciling one entry did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Unchanged,
    Created,
    Updated,
    Repositioned,
    Removed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unchanged => "unchanged",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Repositioned => "repositioned",
            Self::Removed => "removed",
        })
    }
}

/// A field that was rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub field: String,
    pub old: String,
    pub new: String,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.old, self.new)
    }
}

/// Result of reconciling one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: Outcome,
    pub changes: Vec<Change>,
    /// False when a position was declared but its anchor matched nothing
    pub anchored: bool,
    /// Nodes removed
    pub removed: usize,
}

impl Reconciled {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            changes: Vec::new(),
            anchored: true,
            removed: 0,
        }
    }
}

/// Reconciles declared entries against one open stack file
pub struct Reconciler<'a> {
    editor: &'a mut dyn TreeEditor,
    grammar: Grammar,
    target: PathBuf,
}

impl<'a> Reconciler<'a> {
    /// `target` only labels errors.
    pub fn new(editor: &'a mut dyn TreeEditor, grammar: Grammar, target: impl Into<PathBuf>) -> Self {
        Self {
            editor,
            grammar,
            target: target.into(),
        }
    }

    /// Paths of the nodes with `entry`'s identity
    pub fn matches(&self, entry: &DeclaredEntry) -> Result<Vec<NodePath>> {
        let found = self
            .editor
            .matches(&Query::new(locate(entry, self.grammar)))?;
        tracing::debug!(module = %entry.module, matches = found.len(), "matched entry");
        Ok(found)
    }

    pub fn exists(&self, entry: &DeclaredEntry) -> Result<bool> {
        Ok(!self.matches(entry)?.is_empty())
    }

    /// Label for a new top-level node: one past the highest numeric label.
    fn next_seq(&self) -> Result<String> {
        let max = self
            .editor
            .matches(&Query::new(Step::any()))?
            .iter()
            .filter_map(|path| path.label()?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok((max + 1).to_string())
    }

    /// Create a node for `entry`, at its position when one is declared and
    /// the anchor resolves, otherwise after every other node.
    ///
    /// Returns the new node's path and whether it was anchored.
    pub fn create(&mut self, entry: &DeclaredEntry) -> Result<(NodePath, bool)> {
        let label = self.next_seq()?;
        let mut anchored = true;

        let node = match &entry.position {
            Some(position) => {
                let (step, placement) = position.resolve(entry.phase);
                let anchor = self.editor.matches(&Query::new(step.clone()))?;
                match anchor.first() {
                    Some(anchor) => {
                        self.editor
                            .insert(anchor, &label, placement == Placement::Before)?
                    }
                    None => {
                        tracing::warn!(
                            anchor = %step,
                            position = %position,
                            module = %entry.module,
                            "anchor matched nothing, appending entry"
                        );
                        anchored = false;
                        NodePath::root().child(&label)
                    }
                }
            }
            None => NodePath::root().child(&label),
        };

        if entry.optional {
            self.editor.touch(&node.child(fields::OPTIONAL))?;
        }
        if self.grammar.has_service()
            && let Some(service) = &entry.service
        {
            self.editor.set(&node.child(fields::SERVICE), service)?;
        }
        self.editor
            .set(&node.child(fields::TYPE), entry.phase.as_str())?;
        self.editor.set(&node.child(fields::CONTROL), &entry.control)?;
        self.editor.set(&node.child(fields::MODULE), &entry.module)?;
        append_arguments(&mut *self.editor, &node, &entry.arguments)?;

        tracing::debug!(path = %node, module = %entry.module, anchored, "created entry");
        Ok((node, anchored))
    }

    /// Bring the fields of the single node matching `entry` in line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdentityConflict`] when more than one node matches.
    pub fn update(&mut self, entry: &DeclaredEntry) -> Result<Vec<Change>> {
        let found = self.matches(entry)?;
        let node = match found.as_slice() {
            [] => return Ok(Vec::new()),
            [node] => node.clone(),
            _ => {
                return Err(Error::IdentityConflict {
                    path: self.target.clone(),
                    identity: entry.identity(self.grammar.has_service()).to_string(),
                    count: found.len(),
                });
            }
        };

        let mut changes = Vec::new();
        for field in FIELDS.iter().filter(|field| (field.applies)(entry)) {
            let current = (field.read)(&*self.editor, &node)?;
            let declared = (field.declared)(entry);
            if current == declared {
                continue;
            }
            (field.write)(&mut *self.editor, &node, entry)?;
            changes.push(Change {
                field: field.name.to_string(),
                old: current.to_string(),
                new: declared.to_string(),
            });
        }
        Ok(changes)
    }

    /// Remove every node matching `entry`. Returns how many were removed.
    pub fn remove(&mut self, entry: &DeclaredEntry) -> Result<usize> {
        let mut removed = 0;
        for path in self.matches(entry)?.iter().rev() {
            removed += self.editor.rm(path)?;
        }
        Ok(removed)
    }

    /// Whether an existing node matching `entry` sits on the declared side
    /// of its anchor. Entries without a position are always in position.
    pub fn in_position(&self, entry: &DeclaredEntry) -> Result<bool> {
        let Some(position) = &entry.position else {
            return Ok(true);
        };
        let (anchor, placement) = position.resolve(entry.phase);
        let relation = match placement {
            Placement::Before => Expr::following(anchor),
            Placement::After => Expr::preceding(anchor),
        };
        let step = locate(entry, self.grammar).filter(relation);
        Ok(!self.editor.matches(&Query::new(step))?.is_empty())
    }

    /// Drive `entry` to its declared presence.
    pub fn reconcile(&mut self, entry: &DeclaredEntry) -> Result<Reconciled> {
        match entry.presence {
            Presence::Absent => {
                let removed = self.remove(entry)?;
                let mut result = Reconciled::new(if removed > 0 {
                    Outcome::Removed
                } else {
                    Outcome::Unchanged
                });
                result.removed = removed;
                Ok(result)
            }
            Presence::Present => self.ensure_present(entry),
            Presence::Positioned => {
                if entry.position.is_none() {
                    return Err(Error::invalid_declaration(format!(
                        "{} {} is declared positioned without a position",
                        entry.phase, entry.module
                    )));
                }
                if !self.exists(entry)? || self.in_position(entry)? {
                    return self.ensure_present(entry);
                }
                let removed = self.remove(entry)?;
                let (_, anchored) = self.create(entry)?;
                Ok(Reconciled {
                    outcome: Outcome::Repositioned,
                    changes: Vec::new(),
                    anchored,
                    removed,
                })
            }
        }
    }

    fn ensure_present(&mut self, entry: &DeclaredEntry) -> Result<Reconciled> {
        if !self.exists(entry)? {
            let (_, anchored) = self.create(entry)?;
            let mut result = Reconciled::new(Outcome::Created);
            result.anchored = anchored;
            return Ok(result);
        }

        let changes = self.update(entry)?;
        let mut result = Reconciled::new(if changes.is_empty() {
            Outcome::Unchanged
        } else {
            Outcome::Updated
        });
        result.changes = changes;
        Ok(result)
    }
}
