use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

/// An opaque, value-equal unit of knowledge (an axiom).
///
/// The search never looks inside a statement except through its symbols,
/// which drive relevance-based expansion.
pub trait Statement: Clone + Eq + Hash + Ord + Debug {
    type Symbol: Clone + Eq + Hash + Ord + Debug;

    /// Every symbol the statement references.
    fn signature(&self) -> BTreeSet<Self::Symbol>;

    /// Symbols the statement can conclude something about.
    fn defined_symbols(&self) -> BTreeSet<Self::Symbol> {
        self.signature()
    }
}

/// An immutable, deduplicated set of statements.
///
/// Ordered so that every traversal of the same set is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementSet<S: Ord> {
    statements: BTreeSet<S>,
}

impl<S: Ord> Default for StatementSet<S> {
    fn default() -> Self {
        Self {
            statements: BTreeSet::new(),
        }
    }
}

impl<S: Statement> StatementSet<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn contains(&self, statement: &S) -> bool {
        self.statements.contains(statement)
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> + '_ {
        self.statements.iter()
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.statements.is_subset(&other.statements)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.statements.is_disjoint(&other.statements)
    }

    pub fn union(&self, other: &Self) -> Self {
        self.statements.union(&other.statements).cloned().collect()
    }

    pub fn difference(&self, other: &Self) -> Self {
        self.statements.difference(&other.statements).cloned().collect()
    }

    pub fn intersection(&self, other: &Self) -> Self {
        self.statements.intersection(&other.statements).cloned().collect()
    }

    /// Copy of this set with `statement` added.
    pub fn with(&self, statement: S) -> Self {
        let mut statements = self.statements.clone();
        statements.insert(statement);
        Self { statements }
    }

    /// Copy of this set with `statement` removed.
    pub fn without(&self, statement: &S) -> Self {
        let mut statements = self.statements.clone();
        statements.remove(statement);
        Self { statements }
    }

    /// Union of the signatures of all statements.
    pub fn signature(&self) -> BTreeSet<S::Symbol> {
        self.statements.iter().flat_map(|s| s.signature()).collect()
    }

    pub fn to_vec(&self) -> Vec<S> {
        self.statements.iter().cloned().collect()
    }
}

impl<S: Statement> FromIterator<S> for StatementSet<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            statements: iter.into_iter().collect(),
        }
    }
}

impl<S: Statement> IntoIterator for StatementSet<S> {
    type Item = S;
    type IntoIter = std::collections::btree_set::IntoIter<S>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a, S: Statement> IntoIterator for &'a StatementSet<S> {
    type Item = &'a S;
    type IntoIter = std::collections::btree_set::Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

impl<S: Statement> From<Vec<S>> for StatementSet<S> {
    fn from(statements: Vec<S>) -> Self {
        statements.into_iter().collect()
    }
}
