use tracing::debug;

use crate::error::Result;
use crate::models::{SearchConfig, Statement, StatementSet};
use crate::services::hitting_set::{Explanations, HittingSetTree};
use crate::services::monitor::ProgressMonitor;
use crate::services::oracle::{CachedOracle, EntailmentOracle, OracleFactory};
use crate::services::search::JustificationSearch;

/// Find up to `limit` justifications for the oracle's entailment in `kb`.
///
/// `limit == 0` returns at once without consulting the oracle. An entailment
/// that does not hold gives an empty, complete result.
pub fn find_justifications<S, O, M>(
    kb: &StatementSet<S>,
    oracle: &mut O,
    limit: usize,
    config: &SearchConfig,
    monitor: &mut M,
) -> Result<Explanations<O::Entailment, S>>
where
    S: Statement,
    O: EntailmentOracle<S> + ?Sized,
    M: ProgressMonitor<O::Entailment, S> + ?Sized,
{
    config.validate()?;
    if limit == 0 {
        let mut explanations = Explanations::empty();
        explanations.stats.finish();
        return Ok(explanations);
    }

    debug!(
        expansion = %config.expansion,
        contraction = %config.contraction,
        cached = config.cache_oracle,
        "starting justification search"
    );
    let search = JustificationSearch::new(config);
    let tree = HittingSetTree::new(&search, kb, limit, config.order_by_frequency);
    if config.cache_oracle {
        let mut cached = CachedOracle::new(oracle);
        tree.build(&mut cached, monitor)
    } else {
        tree.build(oracle, monitor)
    }
}

/// Explains entailments over one fixed knowledge base.
pub struct ExplanationGenerator<S: Statement, F> {
    kb: StatementSet<S>,
    factory: F,
    config: SearchConfig,
}

impl<S: Statement, F> ExplanationGenerator<S, F> {
    pub fn new(kb: StatementSet<S>, factory: F) -> Self {
        Self::with_config(kb, factory, SearchConfig::default())
    }

    pub fn with_config(kb: StatementSet<S>, factory: F, config: SearchConfig) -> Self {
        Self { kb, factory, config }
    }

    pub fn kb(&self) -> &StatementSet<S> {
        &self.kb
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn explain<E, M>(&self, entailment: E, limit: usize, monitor: &mut M) -> Result<Explanations<E, S>>
    where
        F: OracleFactory<S, E>,
        E: Clone + Eq + std::hash::Hash + std::fmt::Debug,
        M: ProgressMonitor<E, S> + ?Sized,
    {
        let mut oracle = self.factory.create(entailment);
        find_justifications(&self.kb, &mut oracle, limit, &self.config, monitor)
    }

    /// Every justification reachable by the tree.
    pub fn explain_all<E, M>(&self, entailment: E, monitor: &mut M) -> Result<Explanations<E, S>>
    where
        F: OracleFactory<S, E>,
        E: Clone + Eq + std::hash::Hash + std::fmt::Debug,
        M: ProgressMonitor<E, S> + ?Sized,
    {
        self.explain(entailment, usize::MAX, monitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{ContractionStrategy, ExpansionStrategy, Formula};
    use crate::services::monitor::{CancelAfter, NullProgressMonitor};
    use crate::services::oracle::testing::{eqs, Eq2, EqualityOracle};
    use crate::services::propositional::PropositionalOracle;
    use pretty_assertions::assert_eq;

    fn equality_generator(kb: StatementSet<Eq2>) -> ExplanationGenerator<Eq2, impl Fn(Eq2) -> EqualityOracle> {
        ExplanationGenerator::new(kb, |goal: Eq2| EqualityOracle { goal, calls: 0 })
    }

    fn formulas(input: &[&str]) -> StatementSet<Formula> {
        input.iter().map(|s| Formula::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_limit_one_on_a_single_chain() {
        let generator = equality_generator(eqs(&[('A', 'B'), ('B', 'C')]));
        let result = generator.explain(Eq2('A', 'C'), 1, &mut NullProgressMonitor).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.contains_axioms(&eqs(&[('A', 'B'), ('B', 'C')])));
    }

    #[test]
    fn test_both_chains_found() {
        let generator = equality_generator(eqs(&[('A', 'B'), ('B', 'C'), ('A', 'D'), ('D', 'C')]));
        let result = generator.explain(Eq2('A', 'C'), 10, &mut NullProgressMonitor).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains_axioms(&eqs(&[('A', 'B'), ('B', 'C')])));
        assert!(result.contains_axioms(&eqs(&[('A', 'D'), ('D', 'C')])));
        assert!(result.is_complete());
    }

    #[test]
    fn test_not_entailed_is_empty_not_error() {
        let generator = equality_generator(eqs(&[('A', 'B')]));
        let result = generator.explain_all(Eq2('A', 'C'), &mut NullProgressMonitor).unwrap();
        assert!(result.is_empty());
        assert!(!result.cancelled);
    }

    #[test]
    fn test_cancelled_after_first() {
        let generator = equality_generator(eqs(&[('A', 'B'), ('B', 'C'), ('A', 'D'), ('D', 'C')]));
        let mut monitor = CancelAfter::new(1);
        let result = generator.explain(Eq2('A', 'C'), 10, &mut monitor).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.cancelled);
    }

    #[test]
    fn test_zero_limit() {
        let kb = eqs(&[('A', 'C')]);
        let mut oracle = EqualityOracle::new('A', 'C');
        let result =
            find_justifications(&kb, &mut oracle, 0, &SearchConfig::default(), &mut NullProgressMonitor).unwrap();
        assert!(result.is_empty());
        assert_eq!(oracle.calls, 0);
    }

    #[test]
    fn test_cache_saves_oracle_calls() {
        let kb = eqs(&[('A', 'B'), ('B', 'C'), ('A', 'D'), ('D', 'C'), ('A', 'E'), ('E', 'C')]);
        let uncached = SearchConfig {
            cache_oracle: false,
            ..SearchConfig::default()
        };

        let mut plain = EqualityOracle::new('A', 'C');
        let a = find_justifications(&kb, &mut plain, 100, &uncached, &mut NullProgressMonitor).unwrap();
        let mut cached = EqualityOracle::new('A', 'C');
        let b = find_justifications(&kb, &mut cached, 100, &SearchConfig::default(), &mut NullProgressMonitor).unwrap();

        assert_eq!(a.clone().into_set(), b.clone().into_set());
        assert!(cached.calls < plain.calls);
        assert_eq!(b.stats.oracle_calls, cached.calls);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SearchConfig {
            contraction: ContractionStrategy::Windowed,
            window_divisor: 0,
            ..SearchConfig::default()
        };
        let mut oracle = EqualityOracle::new('A', 'C');
        let err = find_justifications(&eqs(&[]), &mut oracle, 1, &config, &mut NullProgressMonitor).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_propositional_explanations() {
        let kb = formulas(&["P", "P -> Q", "Q -> R", "P -> R", "S -> R", "T"]);
        let generator = ExplanationGenerator::with_config(
            kb,
            PropositionalOracle::new,
            SearchConfig::default().with_expansion(ExpansionStrategy::TypePriority),
        );
        let result = generator
            .explain_all(Formula::parse("R").unwrap(), &mut NullProgressMonitor)
            .unwrap();

        let mut sets: Vec<_> = result.iter().map(|j| j.axioms().clone()).collect();
        sets.sort();
        let mut expected = vec![formulas(&["P", "P -> R"]), formulas(&["P", "P -> Q", "Q -> R"])];
        expected.sort();
        assert_eq!(sets, expected);
    }

    #[test]
    fn test_wide_independent_chains() {
        let chain = |p: &str| {
            let mut chain = vec![format!("{}0", p)];
            chain.extend((0..10).map(|i| format!("{}{} -> {}{}", p, i, p, i + 1)));
            chain
        };
        let (x, y) = (chain("X"), chain("Y"));
        let kb: StatementSet<Formula> = x.iter().chain(y.iter()).map(|s| Formula::parse(s).unwrap()).collect();
        let mut oracle = PropositionalOracle::new(Formula::parse("X10 | Y10").unwrap());

        let result =
            find_justifications(&kb, &mut oracle, 10, &SearchConfig::default(), &mut NullProgressMonitor).unwrap();

        let mut sets: Vec<_> = result.iter().map(|j| j.axioms().clone()).collect();
        sets.sort();
        let mut expected = vec![
            x.iter().map(|s| Formula::parse(s).unwrap()).collect::<StatementSet<Formula>>(),
            y.iter().map(|s| Formula::parse(s).unwrap()).collect(),
        ];
        expected.sort();
        assert_eq!(sets, expected);
        assert!(result.is_complete());
    }

    #[test]
    fn test_oracle_failure_reaches_the_caller() {
        let kb = formulas(&["A & B & C -> D", "A", "B", "C"]);
        let mut oracle = PropositionalOracle::new(Formula::parse("D").unwrap()).with_max_atoms(3);
        let err =
            find_justifications(&kb, &mut oracle, 10, &SearchConfig::default(), &mut NullProgressMonitor).unwrap_err();
        assert!(matches!(err, Error::OracleFailure { .. }));
    }

    #[test]
    fn test_inconsistency_explanations() {
        let kb = formulas(&["P", "~P", "Q", "Q -> ~P", "R"]);
        let mut oracle = PropositionalOracle::inconsistency();
        let result =
            find_justifications(&kb, &mut oracle, 10, &SearchConfig::default(), &mut NullProgressMonitor).unwrap();

        let mut sets: Vec<_> = result.iter().map(|j| j.axioms().clone()).collect();
        sets.sort();
        let mut expected = vec![formulas(&["P", "~P"]), formulas(&["P", "Q", "Q -> ~P"])];
        expected.sort();
        assert_eq!(sets, expected);
    }
}
