//! Line diffs between the loaded and the rendered stack file

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// A changed line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "line", rename_all = "lowercase")]
pub enum LineChange {
    Added(String),
    Removed(String),
}

/// Result of comparing two renderings of a stack file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDiff {
    /// Are the texts identical?
    pub is_equivalent: bool,
    /// Changed lines, in order
    pub changes: Vec<LineChange>,
    /// Similarity ratio (0.0 to 1.0)
    pub similarity: f64,
    /// Unified diff text, empty when equivalent
    pub unified: String,
}

impl TreeDiff {
    /// A diff with no changes
    pub fn equivalent() -> Self {
        Self {
            is_equivalent: true,
            changes: Vec::new(),
            similarity: 1.0,
            unified: String::new(),
        }
    }

    /// Compute a line diff; `label` names the file in the unified header.
    pub fn compute(label: &str, old: &str, new: &str) -> Self {
        if old == new {
            return Self::equivalent();
        }

        let text_diff = TextDiff::from_lines(old, new);
        let changes = text_diff
            .iter_all_changes()
            .filter_map(|change| {
                let line = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Delete => Some(LineChange::Removed(line)),
                    ChangeTag::Insert => Some(LineChange::Added(line)),
                    ChangeTag::Equal => None,
                }
            })
            .collect::<Vec<_>>();

        let unified = text_diff
            .unified_diff()
            .context_radius(2)
            .header(label, label)
            .to_string();

        Self {
            is_equivalent: changes.is_empty(),
            changes,
            similarity: f64::from(text_diff.ratio()),
            unified,
        }
    }
}

impl Default for TreeDiff {
    fn default() -> Self {
        Self::equivalent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_are_equivalent() {
        let diff = TreeDiff::compute("f", "a\n", "a\n");
        assert!(diff.is_equivalent);
        assert!(diff.unified.is_empty());
    }

    #[test]
    fn test_reports_added_and_removed_lines() {
        let diff = TreeDiff::compute(
            "/etc/pam.d/sshd",
            "auth required pam_env.so\nauth required pam_deny.so\n",
            "auth required pam_env.so\nauth sufficient pam_test.so\nauth required pam_deny.so\n",
        );
        assert!(!diff.is_equivalent);
        assert_eq!(
            diff.changes,
            [LineChange::Added("auth sufficient pam_test.so".into())]
        );
        assert!(diff.unified.contains("+auth sufficient pam_test.so"));
        assert!(diff.similarity < 1.0);
    }
}
