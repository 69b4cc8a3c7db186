//! Edit records for tree mutations.

use serde::{Deserialize, Serialize};

/// The kind of tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditKind {
    /// A value was set, creating the node if it was missing.
    Set { old: Option<String>, new: String },
    /// A sibling was inserted next to an anchor.
    Insert { anchor: String, before: bool },
    /// A node and its subtree were removed.
    Remove,
    /// A node's value was cleared, creating the node if it was missing.
    Clear { old: Option<String> },
    /// A valueless node was created.
    Touch,
}

/// One mutation applied during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Path of the affected node.
    pub path: String,
    #[serde(flatten)]
    pub kind: EditKind,
}

impl Edit {
    pub fn new(path: impl ToString, kind: EditKind) -> Self {
        Self {
            path: path.to_string(),
            kind,
        }
    }
}

impl std::fmt::Display for Edit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            EditKind::Set { old: Some(old), new } => {
                write!(f, "set {} '{}' -> '{}'", self.path, old, new)
            }
            EditKind::Set { old: None, new } => write!(f, "set {} '{}'", self.path, new),
            EditKind::Insert { anchor, before } => write!(
                f,
                "insert {} {} {}",
                self.path,
                if *before { "before" } else { "after" },
                anchor
            ),
            EditKind::Remove => write!(f, "rm {}", self.path),
            EditKind::Clear { .. } => write!(f, "clear {}", self.path),
            EditKind::Touch => write!(f, "touch {}", self.path),
        }
    }
}
