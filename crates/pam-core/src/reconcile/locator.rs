//! Entry location

use pam_tree::grammar::fields;
use pam_tree::{Expr, Grammar, Step};

use crate::entry::DeclaredEntry;

/// The step selecting every node with `entry`'s identity.
///
/// Zero, one or many nodes may match; the caller decides what the count
/// means.
pub fn locate(entry: &DeclaredEntry, grammar: Grammar) -> Step {
    let mut terms = Vec::with_capacity(4);
    if grammar.has_service()
        && let Some(service) = &entry.service
    {
        terms.push(Expr::eq(fields::SERVICE, service));
    }
    terms.push(Expr::eq(fields::TYPE, entry.phase.as_str()));
    terms.push(Expr::eq(fields::MODULE, &entry.module));
    if entry.control_is_param {
        terms.push(Expr::eq(fields::CONTROL, &entry.control));
    }

    let step = Step::any().filter(Expr::And(terms));
    tracing::debug!(step = %step, "located entry");
    step
}
