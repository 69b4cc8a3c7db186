//! Relative position directives
//!
//! A directive reads `<before|after> <anchor>`. The anchor is either one of
//! a few keyword aliases, resolved against the declared entry's phase:
//!
//! | directive                 | anchor step                                  |
//! |---------------------------|----------------------------------------------|
//! | `before first`            | `*[type='<phase>'][1]`                       |
//! | `after last`              | `*[type='<phase>'][last()]`                  |
//! | `before first required`   | `*[type='<phase>' and control='required'][1]`|
//! | `after last sufficient`   | `*[type='<phase>' and control='sufficient'][last()]` |
//! | `before module pam_deny.so` | `*[type='<phase>' and module='pam_deny.so'][1]` |
//!
//! or, when the keyword is not an alias, a raw step taken verbatim from
//! everything after the placement, e.g.
//! `after *[type='session' and module='pam_limits.so']`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use pam_tree::grammar::fields;
use pam_tree::{Expr, Position as Nth, Step};

use crate::entry::Phase;
use crate::{Error, Result};

/// Which side of the anchor the entry goes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

impl Placement {
    pub fn is_before(self) -> bool {
        self == Self::Before
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
        })
    }
}

/// Keyword anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
    /// First entry of the phase with a given control
    FirstWithControl,
    /// Last entry of the phase with a given control
    LastWithControl,
    /// First entry of the phase with a given module
    FirstWithModule,
    /// First entry of the phase
    First,
    /// Last entry of the phase
    Last,
}

/// Keyword lookup, keyed by whether a value follows the keyword
static ALIASES: LazyLock<HashMap<(bool, &'static str), Alias>> = LazyLock::new(|| {
    HashMap::from([
        ((true, "first"), Alias::FirstWithControl),
        ((true, "last"), Alias::LastWithControl),
        ((true, "module"), Alias::FirstWithModule),
        ((false, "first"), Alias::First),
        ((false, "last"), Alias::Last),
    ])
});

impl Alias {
    /// Look up a keyword; `has_value` selects the table.
    pub fn lookup(keyword: &str, has_value: bool) -> Option<Self> {
        ALIASES.get(&(has_value, keyword)).copied()
    }

    fn step(self, phase: Phase, value: &str) -> Step {
        let of_phase = Expr::eq(fields::TYPE, phase.as_str());
        match self {
            Self::FirstWithControl => Step::any()
                .filter(of_phase.and(Expr::eq(fields::CONTROL, value)))
                .at(Nth::Index(1)),
            Self::LastWithControl => Step::any()
                .filter(of_phase.and(Expr::eq(fields::CONTROL, value)))
                .at(Nth::Last),
            Self::FirstWithModule => Step::any()
                .filter(of_phase.and(Expr::eq(fields::MODULE, value)))
                .at(Nth::Index(1)),
            Self::First => Step::any().filter(of_phase).at(Nth::Index(1)),
            Self::Last => Step::any().filter(of_phase).at(Nth::Last),
        }
    }
}

/// What the entry is placed relative to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Alias {
        alias: Alias,
        value: Option<String>,
    },
    /// A step used verbatim
    Raw(Step),
}

/// A parsed `<before|after> <anchor>` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    placement: Placement,
    anchor: Anchor,
    text: String,
}

impl Position {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let (placement, rest) = text
            .split_once(char::is_whitespace)
            .ok_or_else(|| Error::invalid_position(text, "expected '<before|after> <anchor>'"))?;
        let placement = match placement {
            "before" => Placement::Before,
            "after" => Placement::After,
            other => {
                return Err(Error::invalid_position(
                    text,
                    format!("placement must be 'before' or 'after', got '{other}'"),
                ));
            }
        };

        let rest = rest.trim();
        let words: Vec<&str> = rest.split_whitespace().collect();
        let alias = match words.as_slice() {
            [keyword] => Alias::lookup(keyword, false).map(|alias| (alias, None)),
            [keyword, value] => {
                Alias::lookup(keyword, true).map(|alias| (alias, Some(value.to_string())))
            }
            _ => None,
        };

        let anchor = match alias {
            Some((alias, value)) => Anchor::Alias { alias, value },
            None => Anchor::Raw(
                Step::parse(rest).map_err(|e| Error::invalid_position(text, e.to_string()))?,
            ),
        };

        Ok(Self {
            placement,
            anchor,
            text: text.to_string(),
        })
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// The step selecting the anchor for an entry of `phase`, and the side
    /// of it the entry belongs on.
    pub fn resolve(&self, phase: Phase) -> (Step, Placement) {
        let step = match &self.anchor {
            Anchor::Alias { alias, value } => alias.step(phase, value.as_deref().unwrap_or_default()),
            Anchor::Raw(step) => step.clone(),
        };
        (step, self.placement)
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("before module pam_deny.so", Placement::Before, "*[type='auth' and module='pam_deny.so'][1]")]
    #[case("after first sufficient", Placement::After, "*[type='auth' and control='sufficient'][1]")]
    #[case("before last required", Placement::Before, "*[type='auth' and control='required'][last()]")]
    #[case("before first", Placement::Before, "*[type='auth'][1]")]
    #[case("after last", Placement::After, "*[type='auth'][last()]")]
    fn test_aliases_resolve_against_phase(
        #[case] text: &str,
        #[case] placement: Placement,
        #[case] expected: &str,
    ) {
        let position = Position::parse(text).unwrap();
        let (step, resolved) = position.resolve(Phase::Auth);
        assert_eq!(resolved, placement);
        assert_eq!(step.to_string(), expected);
    }

    #[test]
    fn test_unknown_keyword_falls_back_to_raw_step() {
        let position =
            Position::parse("after *[type='session' and module='pam_limits.so']").unwrap();
        assert!(matches!(position.anchor(), Anchor::Raw(_)));
        let (step, placement) = position.resolve(Phase::Auth);
        assert_eq!(placement, Placement::After);
        assert_eq!(
            step.to_string(),
            "*[type='session' and module='pam_limits.so']"
        );
    }

    #[test]
    fn test_module_without_value_is_a_raw_label() {
        // `module` only names an alias when a value follows it
        let position = Position::parse("before module").unwrap();
        assert_eq!(position.anchor(), &Anchor::Raw(Step::label("module")));
    }

    #[rstest]
    #[case("")]
    #[case("before")]
    #[case("under module pam_deny.so")]
    #[case("before *[type='auth'")]
    fn test_rejects_malformed_directives(#[case] text: &str) {
        assert!(matches!(
            Position::parse(text),
            Err(Error::InvalidPosition { .. })
        ));
    }

    #[test]
    fn test_displays_original_text() {
        let position: Position = "  before module pam_deny.so ".parse().unwrap();
        assert_eq!(position.to_string(), "before module pam_deny.so");
    }
}
