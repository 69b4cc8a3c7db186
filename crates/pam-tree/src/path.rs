//! Node addressing
//!
//! A [`NodePath`] names a node by the labels leading to it from the root,
//! each paired with a [`Slot`] choosing among same-labelled siblings.
//!
//! Paths are label-based rather than index-based: entries carry unique
//! sequence labels, so a path stays valid when unrelated siblings are
//! inserted or removed during a session.
//!
//! ```
//! use pam_tree::NodePath;
//!
//! let entry = NodePath::root().child("3");
//! assert_eq!(entry.nth("argument", 2).to_string(), "/3/argument[2]");
//! assert_eq!(entry.append("argument").to_string(), "/3/argument[last()+1]");
//! ```

use serde::{Deserialize, Serialize};

/// Which of the same-labelled siblings a segment refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// The n-th sibling with the label, 1-based
    Nth(usize),
    /// A new sibling after the last one with the label
    Append,
}

/// One step of a [`NodePath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub label: String,
    pub slot: Slot,
}

/// Address of a node in a [`crate::Tree`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath {
    segments: Vec<Segment>,
}

impl NodePath {
    /// The tree root
    pub fn root() -> Self {
        Self::default()
    }

    /// First child with `label`
    pub fn child(&self, label: &str) -> Self {
        self.nth(label, 1)
    }

    /// The `n`-th (1-based) child with `label`
    pub fn nth(&self, label: &str, n: usize) -> Self {
        self.push(label, Slot::Nth(n))
    }

    /// The slot after the last child with `label`
    pub fn append(&self, label: &str) -> Self {
        self.push(label, Slot::Append)
    }

    fn push(&self, label: &str, slot: Slot) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment {
            label: label.to_string(),
            slot,
        });
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Label of the addressed node
    pub fn label(&self) -> Option<&str> {
        self.segments.last().map(|s| s.label.as_str())
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment.label)?;
            match segment.slot {
                Slot::Nth(1) => {}
                Slot::Nth(n) => write!(f, "[{n}]")?,
                Slot::Append => write!(f, "[last()+1]")?,
            }
        }
        Ok(())
    }
}
