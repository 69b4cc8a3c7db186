//! In-memory node tree

use crate::error::{Error, Result};
use crate::path::{NodePath, Slot};

/// One labelled node with an optional value and ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    label: String,
    value: Option<String>,
    children: Vec<Node>,
    /// Blank lines preceding this node in the source
    pub(crate) trivia: String,
    /// Original line text, kept while the node is unmodified
    pub(crate) source: Option<String>,
}

impl Node {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
            children: Vec::new(),
            trivia: String::new(),
            source: None,
        }
    }

    pub fn with_value(label: impl Into<String>, value: impl Into<String>) -> Self {
        let mut node = Self::new(label);
        node.value = Some(value.into());
        node
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// First child labelled `label`
    pub fn child(&self, label: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.label == label)
    }

    /// Value of the first child labelled `label`
    pub fn child_value(&self, label: &str) -> Option<&str> {
        self.child(label).and_then(Node::value)
    }

    /// Values of every child labelled `label`, in order
    pub fn child_values<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.children
            .iter()
            .filter(move |c| c.label == label)
            .filter_map(Node::value)
    }

    /// 1-based rank of child `idx` among siblings sharing its label
    pub(crate) fn rank_of(&self, idx: usize) -> usize {
        let label = &self.children[idx].label;
        self.children[..=idx]
            .iter()
            .filter(|c| &c.label == label)
            .count()
    }

    fn index_of(&self, label: &str, slot: Slot) -> Option<usize> {
        match slot {
            Slot::Nth(n) if n > 0 => self
                .children
                .iter()
                .enumerate()
                .filter(|(_, c)| c.label == label)
                .nth(n - 1)
                .map(|(i, _)| i),
            _ => None,
        }
    }

    /// Index at which a new child labelled `label` is appended: right after
    /// the last sibling with that label, or at the end.
    fn append_index(&self, label: &str) -> usize {
        self.children
            .iter()
            .rposition(|c| c.label == label)
            .map_or(self.children.len(), |i| i + 1)
    }

    fn count(&self, label: &str) -> usize {
        self.children.iter().filter(|c| c.label == label).count()
    }
}

/// A parsed stack file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    root: Node,
    /// Blank lines after the last node
    pub(crate) trailing: String,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            root: Node::new(""),
            trailing: String::new(),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub(crate) fn push(&mut self, node: Node) {
        self.root.children.push(node);
    }

    /// Resolve a path to child indices, one per segment.
    fn locate(&self, path: &NodePath) -> Option<Vec<usize>> {
        let mut indices = Vec::with_capacity(path.segments().len());
        let mut node = &self.root;
        for segment in path.segments() {
            let idx = node.index_of(&segment.label, segment.slot)?;
            indices.push(idx);
            node = &node.children[idx];
        }
        Some(indices)
    }

    /// Look up the node at `path`
    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        let mut node = &self.root;
        for segment in path.segments() {
            let idx = node.index_of(&segment.label, segment.slot)?;
            node = &node.children[idx];
        }
        Some(node)
    }

    fn node_at_mut(&mut self, indices: &[usize]) -> &mut Node {
        let mut node = &mut self.root;
        for &idx in indices {
            node = &mut node.children[idx];
        }
        node
    }

    /// Forget the original text of the top-level node a path runs through.
    fn mark_dirty(&mut self, indices: &[usize]) {
        if let Some(&top) = indices.first() {
            self.root.children[top].source = None;
        }
    }

    /// Resolve `path`, creating missing nodes along the way.
    ///
    /// A missing segment is creatable when it is an append slot or names the
    /// next free rank (`argument[3]` when two arguments exist).
    fn ensure(&mut self, path: &NodePath) -> Result<Vec<usize>> {
        if path.is_root() {
            return Err(Error::InvalidEdit {
                path: path.to_string(),
                reason: "the root node cannot be edited".into(),
            });
        }

        let mut indices = Vec::with_capacity(path.segments().len());
        for segment in path.segments() {
            let node = self.node_at_mut(&indices);
            let idx = match node.index_of(&segment.label, segment.slot) {
                Some(idx) => idx,
                None => {
                    let creatable = match segment.slot {
                        Slot::Append => true,
                        Slot::Nth(n) => n == node.count(&segment.label) + 1,
                    };
                    if !creatable {
                        return Err(Error::path_not_found(path));
                    }
                    let at = node.append_index(&segment.label);
                    node.children.insert(at, Node::new(segment.label.clone()));
                    at
                }
            };
            indices.push(idx);
        }
        self.mark_dirty(&indices);
        Ok(indices)
    }

    /// Value at `path`; `None` when the node is missing or valueless.
    pub fn get(&self, path: &NodePath) -> Option<&str> {
        self.node(path).and_then(Node::value)
    }

    /// Set the value at `path`, creating the node if needed. Returns the
    /// previous value.
    pub fn set(&mut self, path: &NodePath, value: &str) -> Result<Option<String>> {
        let indices = self.ensure(path)?;
        let node = self.node_at_mut(&indices);
        Ok(node.value.replace(value.to_string()))
    }

    /// Create the node at `path` if absent. Returns whether it was created.
    pub fn touch(&mut self, path: &NodePath) -> Result<bool> {
        if self.locate(path).is_some() {
            return Ok(false);
        }
        self.ensure(path)?;
        Ok(true)
    }

    /// Ensure the node at `path` exists and has no value. Returns the
    /// previous value.
    pub fn clear(&mut self, path: &NodePath) -> Result<Option<String>> {
        let indices = self.ensure(path)?;
        Ok(self.node_at_mut(&indices).value.take())
    }

    /// Insert an empty sibling labelled `label` next to `anchor`.
    pub fn insert(&mut self, anchor: &NodePath, label: &str, before: bool) -> Result<NodePath> {
        let indices = self
            .locate(anchor)
            .ok_or_else(|| Error::path_not_found(anchor))?;
        let (&anchor_idx, parent_indices) = indices.split_last().ok_or_else(|| {
            Error::InvalidEdit {
                path: anchor.to_string(),
                reason: "cannot insert next to the root node".into(),
            }
        })?;

        let parent = self.node_at_mut(parent_indices);
        let mut node = Node::new(label);
        let at = if before {
            // Blank lines stay ahead of the block they separate
            node.trivia = std::mem::take(&mut parent.children[anchor_idx].trivia);
            anchor_idx
        } else {
            anchor_idx + 1
        };
        parent.children.insert(at, node);
        let rank = parent.rank_of(at);

        let mut new_indices = parent_indices.to_vec();
        new_indices.push(at);
        self.mark_dirty(&new_indices);

        let parent_path = anchor.parent().unwrap_or_default();
        Ok(parent_path.nth(label, rank))
    }

    /// Remove the node at `path`. Returns whether a node was removed.
    pub fn remove(&mut self, path: &NodePath) -> Result<bool> {
        let Some(indices) = self.locate(path) else {
            return Ok(false);
        };
        let Some((&idx, parent_indices)) = indices.split_last() else {
            return Err(Error::InvalidEdit {
                path: path.to_string(),
                reason: "the root node cannot be removed".into(),
            });
        };
        self.mark_dirty(&indices);
        let parent = self.node_at_mut(parent_indices);
        let removed = parent.children.remove(idx);
        // Keep the separation the removed line had from its predecessor
        if !removed.trivia.is_empty()
            && parent_indices.is_empty()
            && let Some(next) = parent.children.get_mut(idx)
            && next.trivia.is_empty()
        {
            next.trivia = removed.trivia;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, module: &str) -> Node {
        let mut node = Node::new(label);
        node.push(Node::with_value("type", "auth"));
        node.push(Node::with_value("module", module));
        node
    }

    fn sample() -> Tree {
        let mut tree = Tree::new();
        tree.push(Node::with_value(crate::COMMENT_LABEL, "%PAM-1.0"));
        tree.push(entry("1", "pam_env.so"));
        tree.push(entry("2", "pam_deny.so"));
        tree
    }

    #[test]
    fn test_set_creates_missing_entry_and_field() {
        let mut tree = sample();
        let path = NodePath::root().child("3").child("module");
        assert_eq!(tree.set(&path, "pam_unix.so").unwrap(), None);
        assert_eq!(tree.get(&path), Some("pam_unix.so"));
        assert_eq!(tree.root().children().last().unwrap().label(), "3");
    }

    #[test]
    fn test_set_refuses_rank_gaps() {
        let mut tree = sample();
        let path = NodePath::root().child("1").nth("argument", 2);
        assert!(matches!(
            tree.set(&path, "x"),
            Err(Error::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_append_slot_adds_after_last_same_label() {
        let mut tree = sample();
        let entry = NodePath::root().child("1");
        tree.set(&entry.append("argument"), "a").unwrap();
        tree.set(&entry.append("argument"), "b").unwrap();
        let node = tree.node(&entry).unwrap();
        assert_eq!(node.child_values("argument").collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_insert_before_returns_path_of_new_node() {
        let mut tree = sample();
        let path = tree
            .insert(&NodePath::root().child("2"), "3", true)
            .unwrap();
        assert_eq!(path, NodePath::root().child("3"));
        let labels: Vec<_> = tree.root().children().iter().map(Node::label).collect();
        assert_eq!(labels, ["#comment", "1", "3", "2"]);
    }

    #[test]
    fn test_insert_requires_existing_anchor() {
        let mut tree = sample();
        assert!(tree.insert(&NodePath::root().child("9"), "3", false).is_err());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut tree = sample();
        assert!(!tree.remove(&NodePath::root().child("9")).unwrap());
        assert!(tree.remove(&NodePath::root().child("1")).unwrap());
        assert!(tree.node(&NodePath::root().child("1")).is_none());
    }

    #[test]
    fn test_touch_and_clear_leave_valueless_node() {
        let mut tree = sample();
        let marker = NodePath::root().child("1").child("optional");
        assert!(tree.touch(&marker).unwrap());
        assert!(!tree.touch(&marker).unwrap());
        assert!(tree.node(&marker).is_some());
        assert_eq!(tree.get(&marker), None);

        let module = NodePath::root().child("2").child("module");
        assert_eq!(tree.clear(&module).unwrap(), Some("pam_deny.so".to_string()));
        assert_eq!(tree.get(&module), None);
    }

    #[test]
    fn test_edits_forget_original_line() {
        let mut tree = sample();
        tree.root.children[1].source = Some("auth pam_env.so".into());
        tree.set(&NodePath::root().child("1").child("module"), "pam_x.so")
            .unwrap();
        assert_eq!(tree.root().children()[1].source, None);
    }
}
