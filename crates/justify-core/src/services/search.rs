use tracing::debug;

use crate::error::Result;
use crate::models::{ContractionStrategy, ExpansionStrategy, Justification, SearchConfig, Statement, StatementSet};
use crate::services::monitor::ProgressMonitor;
use crate::services::oracle::EntailmentOracle;

/// Finds one justification by expanding towards entailment, then contracting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JustificationSearch {
    expansion: ExpansionStrategy,
    contraction: ContractionStrategy,
    initial_entailment_check: bool,
    window_divisor: usize,
}

impl Default for JustificationSearch {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl JustificationSearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            expansion: config.expansion,
            contraction: config.contraction,
            initial_entailment_check: config.initial_entailment_check,
            window_divisor: config.window_divisor,
        }
    }

    pub fn expansion(&self) -> ExpansionStrategy {
        self.expansion
    }

    pub fn contraction(&self) -> ContractionStrategy {
        self.contraction
    }

    /// One justification for the oracle's entailment drawn from `kb`.
    ///
    /// The result is empty when `kb` does not entail, and also when the
    /// monitor cancelled before the search finished; callers tell the two
    /// apart by polling the monitor.
    pub fn find_one<S, O, M>(
        &self,
        kb: &StatementSet<S>,
        oracle: &mut O,
        monitor: &M,
    ) -> Result<Justification<O::Entailment, S>>
    where
        S: Statement,
        O: EntailmentOracle<S> + ?Sized,
        M: ProgressMonitor<O::Entailment, S> + ?Sized,
    {
        let entailment = oracle.entailment().clone();
        let empty = || Justification::empty(entailment.clone());

        let module = oracle.module(kb);
        debug!(kb = kb.len(), module = module.len(), "searching for a justification");
        if !oracle.is_entailed(&module)? {
            return Ok(empty());
        }
        if monitor.is_cancelled() {
            return Ok(empty());
        }

        let expanded = self
            .expansion
            .expand(&module, oracle, monitor, self.initial_entailment_check)?;
        if monitor.is_cancelled() || expanded.is_empty() {
            return Ok(empty());
        }

        let expanded_module = oracle.module(&expanded);
        let axioms = self
            .contraction
            .contract(&expanded_module, oracle, monitor, self.window_divisor)?;
        if monitor.is_cancelled() {
            return Ok(empty());
        }

        Ok(Justification::new(entailment, axioms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::monitor::{CancellationToken, NullProgressMonitor};
    use crate::services::oracle::testing::{eqs, EqualityOracle};

    #[test]
    fn test_finds_the_only_chain() {
        let kb = eqs(&[('A', 'B'), ('B', 'C'), ('C', 'D'), ('X', 'Y')]);
        let mut oracle = EqualityOracle::new('A', 'C');
        let j = JustificationSearch::default()
            .find_one(&kb, &mut oracle, &NullProgressMonitor)
            .unwrap();
        assert_eq!(j.axioms(), &eqs(&[('A', 'B'), ('B', 'C')]));
        assert_eq!(j.entailment(), oracle.entailment());
    }

    #[test]
    fn test_not_entailed_is_empty() {
        let kb = eqs(&[('A', 'B')]);
        let mut oracle = EqualityOracle::new('A', 'C');
        let j = JustificationSearch::default()
            .find_one(&kb, &mut oracle, &NullProgressMonitor)
            .unwrap();
        assert!(j.is_empty());
        assert_eq!(oracle.calls, 1);
    }

    #[test]
    fn test_every_strategy_pair_agrees_on_a_unique_justification() {
        let kb = eqs(&[('A', 'B'), ('B', 'C'), ('C', 'D'), ('D', 'E'), ('X', 'Y'), ('Y', 'A')]);
        let expected = eqs(&[('A', 'B'), ('B', 'C'), ('C', 'D')]);
        for expansion in [
            ExpansionStrategy::Simple,
            ExpansionStrategy::Structural,
            ExpansionStrategy::TypePriority,
            ExpansionStrategy::Modularity,
        ] {
            for contraction in [
                ContractionStrategy::Simple,
                ContractionStrategy::Windowed,
                ContractionStrategy::DivideAndConquer,
            ] {
                let config = SearchConfig::default()
                    .with_expansion(expansion)
                    .with_contraction(contraction);
                let mut oracle = EqualityOracle::new('A', 'D');
                let j = JustificationSearch::new(&config)
                    .find_one(&kb, &mut oracle, &NullProgressMonitor)
                    .unwrap();
                assert_eq!(j.axioms(), &expected, "{} + {}", expansion, contraction);
            }
        }
    }

    #[test]
    fn test_cancelled_search_is_empty() {
        let kb = eqs(&[('A', 'B'), ('B', 'C')]);
        let token = CancellationToken::new();
        token.cancel();
        let mut oracle = EqualityOracle::new('A', 'C');
        let j = JustificationSearch::default()
            .find_one(&kb, &mut oracle, &token)
            .unwrap();
        assert!(j.is_empty());
    }
}
