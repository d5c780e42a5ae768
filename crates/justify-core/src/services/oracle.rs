use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::Result;
use crate::models::{Statement, StatementSet};

/// Black-box decision procedure for one fixed entailment.
///
/// `is_entailed` must be monotonic: if it holds for a set it holds for every
/// superset. All pruning in the hitting-set tree depends on this.
pub trait EntailmentOracle<S: Statement> {
    type Entailment: Clone + Eq + Hash + Debug;

    fn entailment(&self) -> &Self::Entailment;

    fn is_entailed(&mut self, axioms: &StatementSet<S>) -> Result<bool>;

    /// A subset of `axioms` containing every justification drawn from it.
    fn module(&self, axioms: &StatementSet<S>) -> StatementSet<S> {
        axioms.clone()
    }

    /// Symbols referenced by the entailment; seeds structural expansion.
    fn entailment_signature(&self) -> BTreeSet<S::Symbol>;

    /// An entailing subset of `axioms`, valid after `is_entailed(axioms)`
    /// returned true.
    fn entailing_axioms(&self, axioms: &StatementSet<S>) -> StatementSet<S> {
        axioms.clone()
    }

    /// Decision procedure invocations since the last reset
    fn call_count(&self) -> u64;

    fn reset_call_count(&mut self);
}

impl<S: Statement, O: EntailmentOracle<S> + ?Sized> EntailmentOracle<S> for &mut O {
    type Entailment = O::Entailment;

    fn entailment(&self) -> &Self::Entailment {
        (**self).entailment()
    }

    fn is_entailed(&mut self, axioms: &StatementSet<S>) -> Result<bool> {
        (**self).is_entailed(axioms)
    }

    fn module(&self, axioms: &StatementSet<S>) -> StatementSet<S> {
        (**self).module(axioms)
    }

    fn entailment_signature(&self) -> BTreeSet<S::Symbol> {
        (**self).entailment_signature()
    }

    fn entailing_axioms(&self, axioms: &StatementSet<S>) -> StatementSet<S> {
        (**self).entailing_axioms(axioms)
    }

    fn call_count(&self) -> u64 {
        (**self).call_count()
    }

    fn reset_call_count(&mut self) {
        (**self).reset_call_count()
    }
}

/// Creates an oracle for a given entailment.
pub trait OracleFactory<S: Statement, E> {
    type Oracle: EntailmentOracle<S, Entailment = E>;

    fn create(&self, entailment: E) -> Self::Oracle;
}

impl<S, E, O, F> OracleFactory<S, E> for F
where
    S: Statement,
    O: EntailmentOracle<S, Entailment = E>,
    F: Fn(E) -> O,
{
    type Oracle = O;

    fn create(&self, entailment: E) -> O {
        self(entailment)
    }
}

// ─── Monotonic answer cache ──────────────────────────────────────────────────

/// Memoizes oracle answers and answers by monotonicity where it can.
///
/// A query is entailed if a known entailing set is a subset of it, and not
/// entailed if it is a subset of a known non-entailing set.
#[derive(Debug)]
pub struct CachedOracle<S: Ord, O> {
    inner: O,
    /// Entailing inputs paired with the entailing subset the oracle reported
    entailing: Vec<(StatementSet<S>, StatementSet<S>)>,
    non_entailing: Vec<StatementSet<S>>,
    hits: u64,
}

impl<S: Statement, O: EntailmentOracle<S>> CachedOracle<S, O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            entailing: Vec::new(),
            non_entailing: Vec::new(),
            hits: 0,
        }
    }

    /// Queries answered without consulting the wrapped oracle
    pub fn cache_hits(&self) -> u64 {
        self.hits
    }

    pub fn into_inner(self) -> O {
        self.inner
    }

    fn lookup(&self, axioms: &StatementSet<S>) -> Option<bool> {
        if self.entailing.iter().any(|(known, _)| known.is_subset(axioms)) {
            return Some(true);
        }
        if self.non_entailing.iter().any(|known| axioms.is_subset(known)) {
            return Some(false);
        }
        None
    }
}

impl<S: Statement, O: EntailmentOracle<S>> EntailmentOracle<S> for CachedOracle<S, O> {
    type Entailment = O::Entailment;

    fn entailment(&self) -> &Self::Entailment {
        self.inner.entailment()
    }

    fn is_entailed(&mut self, axioms: &StatementSet<S>) -> Result<bool> {
        if let Some(answer) = self.lookup(axioms) {
            self.hits += 1;
            return Ok(answer);
        }
        let answer = self.inner.is_entailed(axioms)?;
        if answer {
            let witness = self.inner.entailing_axioms(axioms);
            self.entailing.push((axioms.clone(), witness));
        } else {
            // Drop entries the new one subsumes.
            self.non_entailing.retain(|known| !known.is_subset(axioms));
            self.non_entailing.push(axioms.clone());
        }
        Ok(answer)
    }

    fn module(&self, axioms: &StatementSet<S>) -> StatementSet<S> {
        self.inner.module(axioms)
    }

    fn entailment_signature(&self) -> BTreeSet<S::Symbol> {
        self.inner.entailment_signature()
    }

    fn entailing_axioms(&self, axioms: &StatementSet<S>) -> StatementSet<S> {
        self.entailing
            .iter()
            .filter(|(known, _)| known.is_subset(axioms))
            .map(|(_, witness)| witness)
            .min_by_key(|witness| witness.len())
            .cloned()
            .unwrap_or_else(|| self.inner.entailing_axioms(axioms))
    }

    fn call_count(&self) -> u64 {
        self.inner.call_count()
    }

    fn reset_call_count(&mut self) {
        self.inner.reset_call_count()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_equality_oracle_is_transitive() {
        let mut oracle = EqualityOracle::new('A', 'C');
        assert!(oracle.is_entailed(&eqs(&[('A', 'B'), ('B', 'C')])).unwrap());
        assert!(!oracle.is_entailed(&eqs(&[('A', 'B')])).unwrap());
        assert!(oracle.is_entailed(&eqs(&[('B', 'A'), ('C', 'B')])).unwrap());
        assert_eq!(oracle.call_count(), 3);
    }

    #[test]
    fn test_cache_answers_supersets_of_entailing_sets() {
        let mut cached = CachedOracle::new(EqualityOracle::new('A', 'C'));
        assert!(cached.is_entailed(&eqs(&[('A', 'B'), ('B', 'C')])).unwrap());
        assert!(cached.is_entailed(&eqs(&[('A', 'B'), ('B', 'C'), ('C', 'D')])).unwrap());
        assert_eq!(cached.call_count(), 1);
        assert_eq!(cached.cache_hits(), 1);
    }

    #[test]
    fn test_cache_answers_subsets_of_non_entailing_sets() {
        let mut cached = CachedOracle::new(EqualityOracle::new('A', 'C'));
        assert!(!cached.is_entailed(&eqs(&[('A', 'B'), ('C', 'D')])).unwrap());
        assert!(!cached.is_entailed(&eqs(&[('A', 'B')])).unwrap());
        assert!(!cached.is_entailed(&eqs(&[('A', 'D')])).unwrap());
        assert_eq!(cached.call_count(), 2);
        assert_eq!(cached.cache_hits(), 1);
    }

    #[test]
    fn test_cache_entailing_axioms_is_smallest_known_witness() {
        let mut cached = CachedOracle::new(EqualityOracle::new('A', 'C'));
        let chain = eqs(&[('A', 'C')]);
        cached.is_entailed(&chain).unwrap();
        let big = eqs(&[('A', 'B'), ('A', 'C'), ('B', 'C')]);
        assert_eq!(cached.entailing_axioms(&big), chain);
    }

    #[test]
    fn test_closure_factory() {
        let factory = |goal: Eq2| EqualityOracle { goal, calls: 0 };
        let oracle = OracleFactory::<Eq2, Eq2>::create(&factory, Eq2('A', 'B'));
        assert_eq!(oracle.entailment(), &Eq2('A', 'B'));
    }

    #[test]
    fn test_mut_ref_forwards() {
        fn ask<O: EntailmentOracle<Eq2>>(mut oracle: O) -> bool {
            oracle.is_entailed(&eqs(&[('A', 'B')])).unwrap()
        }

        let mut oracle = EqualityOracle::new('A', 'B');
        assert!(ask(&mut oracle));
        assert_eq!(oracle.call_count(), 1);
    }
}
