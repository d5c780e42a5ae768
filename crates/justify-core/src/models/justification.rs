use serde::{Deserialize, Serialize};
use std::fmt;

use super::statement::{Statement, StatementSet};

/// A minimal set of axioms that is sufficient for an entailment.
///
/// Only the search creates non-empty justifications. An empty axiom set is
/// the sentinel for "the entailment does not hold over the searched set".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Justification<E, S: Ord> {
    entailment: E,
    axioms: StatementSet<S>,
}

impl<E, S: Statement> Justification<E, S> {
    pub fn new(entailment: E, axioms: StatementSet<S>) -> Self {
        Self { entailment, axioms }
    }

    /// The "not entailed" sentinel.
    pub fn empty(entailment: E) -> Self {
        Self::new(entailment, StatementSet::new())
    }

    pub fn entailment(&self) -> &E {
        &self.entailment
    }

    pub fn axioms(&self) -> &StatementSet<S> {
        &self.axioms
    }

    pub fn len(&self) -> usize {
        self.axioms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axioms.is_empty()
    }

    pub fn contains(&self, axiom: &S) -> bool {
        self.axioms.contains(axiom)
    }

    pub fn into_axioms(self) -> StatementSet<S> {
        self.axioms
    }
}

impl<E: fmt::Display, S: Statement + fmt::Display> Justification<E, S> {
    /// Multi-line rendering: the entailment, then one axiom per line.
    pub fn display_string(&self) -> String {
        if self.is_empty() {
            return "Justification: <empty>".to_string();
        }
        let mut out = format!("Justification for {}", self.entailment);
        for axiom in self.axioms.iter() {
            out.push_str(&format!("\n\t{}", axiom));
        }
        out
    }
}
