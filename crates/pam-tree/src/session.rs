//! Scoped editing sessions
//!
//! A [`Session`] owns the parsed tree of one stack file for the length of
//! one transaction. It holds an exclusive advisory lock on the file,
//! records every mutation, and either commits the result atomically or
//! drops it.

use pam_fs::io::{self, FileLock};
use pam_fs::NormalizedPath;

use crate::diff::TreeDiff;
use crate::edit::{Edit, EditKind};
use crate::editor::TreeEditor;
use crate::error::Result;
use crate::grammar::Grammar;
use crate::node::Tree;
use crate::path::NodePath;
use crate::query::Query;

/// What a commit did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing to write
    Unchanged,
    /// The file was rewritten
    Written { edits: usize },
}

/// An open transaction against one stack file
#[derive(Debug)]
pub struct Session {
    path: NormalizedPath,
    grammar: Grammar,
    original: String,
    tree: Tree,
    edits: Vec<Edit>,
    _lock: Option<FileLock>,
}

impl Session {
    /// Lock and parse `path`. A missing file opens as an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Parse`] naming `path` when the file does not
    /// parse under `grammar`.
    pub fn open(path: &NormalizedPath, grammar: Grammar) -> Result<Self> {
        let mut lock = io::lock_exclusive(path)?;
        let original = match lock.as_mut() {
            Some(lock) => lock.read_to_string()?,
            None => String::new(),
        };
        let tree = grammar.parse(path.as_ref(), &original)?;
        tracing::debug!(path = %path, grammar = grammar.name(), "opened session");

        Ok(Self {
            path: path.clone(),
            grammar,
            original,
            tree,
            edits: Vec::new(),
            _lock: lock,
        })
    }

    /// Build an unlocked session over in-memory text. Committing it writes
    /// to `path`.
    pub fn from_source(path: &NormalizedPath, grammar: Grammar, source: &str) -> Result<Self> {
        Ok(Self {
            path: path.clone(),
            grammar,
            original: source.to_string(),
            tree: grammar.parse(path.as_ref(), source)?,
            edits: Vec::new(),
            _lock: None,
        })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutations recorded so far
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Render the current tree
    pub fn render(&self) -> Result<String> {
        self.grammar.render(&self.tree)
    }

    /// Diff between the loaded text and the current rendering
    pub fn diff(&self) -> Result<TreeDiff> {
        if !self.is_modified() {
            return Ok(TreeDiff::equivalent());
        }
        Ok(TreeDiff::compute(
            self.path.as_str(),
            &self.original,
            &self.render()?,
        ))
    }

    /// Write the current tree back if anything changed.
    pub fn commit(self) -> Result<CommitOutcome> {
        if self.edits.is_empty() {
            return Ok(CommitOutcome::Unchanged);
        }
        let rendered = self.render()?;
        if rendered == self.original {
            return Ok(CommitOutcome::Unchanged);
        }
        io::write_atomic(&self.path, rendered.as_bytes())?;
        tracing::info!(path = %self.path, edits = self.edits.len(), "committed stack file");
        Ok(CommitOutcome::Written {
            edits: self.edits.len(),
        })
    }

    /// Drop every recorded mutation. Returns how many were discarded.
    pub fn discard(self) -> usize {
        if !self.edits.is_empty() {
            tracing::debug!(path = %self.path, edits = self.edits.len(), "discarded session");
        }
        self.edits.len()
    }

    fn record(&mut self, path: &NodePath, kind: EditKind) {
        tracing::trace!(path = %path, ?kind, "edit");
        self.edits.push(Edit::new(path, kind));
    }
}

impl TreeEditor for Session {
    fn matches(&self, query: &Query) -> Result<Vec<NodePath>> {
        let found = query.evaluate(&self.tree);
        tracing::trace!(query = %query, matches = found.len(), "match");
        Ok(found)
    }

    fn get(&self, path: &NodePath) -> Result<Option<String>> {
        Ok(self.tree.get(path).map(str::to_string))
    }

    fn set(&mut self, path: &NodePath, value: &str) -> Result<()> {
        if self.tree.node(path).and_then(|n| n.value()) == Some(value) {
            return Ok(());
        }
        let old = self.tree.set(path, value)?;
        self.record(
            path,
            EditKind::Set {
                old,
                new: value.to_string(),
            },
        );
        Ok(())
    }

    fn insert(&mut self, anchor: &NodePath, label: &str, before: bool) -> Result<NodePath> {
        let created = self.tree.insert(anchor, label, before)?;
        self.record(
            &created,
            EditKind::Insert {
                anchor: anchor.to_string(),
                before,
            },
        );
        Ok(created)
    }

    fn rm(&mut self, path: &NodePath) -> Result<usize> {
        if !self.tree.remove(path)? {
            return Ok(0);
        }
        self.record(path, EditKind::Remove);
        Ok(1)
    }

    fn clear(&mut self, path: &NodePath) -> Result<()> {
        if self.tree.node(path).is_some_and(|n| n.value().is_none()) {
            return Ok(());
        }
        let old = self.tree.clear(path)?;
        self.record(path, EditKind::Clear { old });
        Ok(())
    }

    fn touch(&mut self, path: &NodePath) -> Result<()> {
        if self.tree.touch(path)? {
            self.record(path, EditKind::Touch);
        }
        Ok(())
    }
}
