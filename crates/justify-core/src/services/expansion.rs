use tracing::debug;

use crate::error::Result;
use crate::models::{ExpansionStrategy, Statement, StatementSet};
use crate::services::monitor::ProgressMonitor;
use crate::services::oracle::EntailmentOracle;
use crate::services::signature_index::SignatureIndex;

impl ExpansionStrategy {
    /// Grow a subset of `kb` until the oracle reports entailment.
    ///
    /// Returns the empty set when `kb` itself does not entail, or when the
    /// monitor cancels the search.
    pub fn expand<S, O, M>(
        &self,
        kb: &StatementSet<S>,
        oracle: &mut O,
        monitor: &M,
        initial_entailment_check: bool,
    ) -> Result<StatementSet<S>>
    where
        S: Statement,
        O: EntailmentOracle<S> + ?Sized,
        M: ProgressMonitor<O::Entailment, S> + ?Sized,
    {
        let expanded = match self {
            ExpansionStrategy::Simple => expand_simple(kb, oracle, monitor)?,
            ExpansionStrategy::Structural => expand_structural(kb, oracle, monitor, false)?,
            ExpansionStrategy::TypePriority => {
                if initial_entailment_check && !oracle.is_entailed(kb)? {
                    return Ok(StatementSet::new());
                }
                expand_structural(kb, oracle, monitor, true)?
            }
            ExpansionStrategy::Modularity => {
                if oracle.is_entailed(kb)? {
                    kb.clone()
                } else {
                    StatementSet::new()
                }
            }
        };
        debug!(strategy = %self, input = kb.len(), output = expanded.len(), "expanded");
        Ok(expanded)
    }
}

fn expand_simple<S, O, M>(kb: &StatementSet<S>, oracle: &mut O, monitor: &M) -> Result<StatementSet<S>>
where
    S: Statement,
    O: EntailmentOracle<S> + ?Sized,
    M: ProgressMonitor<O::Entailment, S> + ?Sized,
{
    let mut working = StatementSet::new();
    for statement in kb {
        if monitor.is_cancelled() {
            return Ok(StatementSet::new());
        }
        working = working.with(statement.clone());
        if oracle.is_entailed(&working)? {
            return Ok(working);
        }
    }
    Ok(StatementSet::new())
}

/// Relevance closure from the entailment signature.
///
/// Each round adds the statements mentioning a symbol already reached. With
/// `prefer_defining`, statements that define a reached symbol are added
/// first and the plain closure is only used when there are none. A round
/// that adds nothing jumps straight to the whole input.
fn expand_structural<S, O, M>(
    kb: &StatementSet<S>,
    oracle: &mut O,
    monitor: &M,
    prefer_defining: bool,
) -> Result<StatementSet<S>>
where
    S: Statement,
    O: EntailmentOracle<S> + ?Sized,
    M: ProgressMonitor<O::Entailment, S> + ?Sized,
{
    let index = SignatureIndex::build(kb);
    let mut symbols = oracle.entailment_signature();
    let mut working = StatementSet::new();
    let mut round = 0usize;

    while working.len() < kb.len() {
        if monitor.is_cancelled() {
            return Ok(StatementSet::new());
        }
        round += 1;

        let mut added = StatementSet::new();
        if prefer_defining {
            added = index.defining_any(&symbols).difference(&working);
        }
        if added.is_empty() {
            added = index.referencing_any(&symbols).difference(&working);
        }
        if added.is_empty() {
            debug!(round, "relevance closure stalled, using whole input");
            working = kb.clone();
        } else {
            working = working.union(&added);
        }
        symbols = working.signature();

        if oracle.is_entailed(&working)? {
            return Ok(if prefer_defining {
                oracle.entailing_axioms(&working)
            } else {
                working
            });
        }
    }
    Ok(StatementSet::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::monitor::{CancellationToken, NullProgressMonitor};
    use crate::services::oracle::testing::{eqs, EqualityOracle};

    const ALL: [ExpansionStrategy; 4] = [
        ExpansionStrategy::Simple,
        ExpansionStrategy::Structural,
        ExpansionStrategy::TypePriority,
        ExpansionStrategy::Modularity,
    ];

    #[test]
    fn test_every_strategy_reaches_an_entailing_set() {
        let kb = eqs(&[('A', 'B'), ('B', 'C'), ('X', 'Y'), ('Y', 'Z')]);
        for strategy in ALL {
            let mut oracle = EqualityOracle::new('A', 'C');
            let expanded = strategy.expand(&kb, &mut oracle, &NullProgressMonitor, true).unwrap();
            assert!(expanded.is_subset(&kb), "{}", strategy);
            assert!(oracle.is_entailed(&expanded).unwrap(), "{}", strategy);
        }
    }

    #[test]
    fn test_every_strategy_returns_empty_when_not_entailed() {
        let kb = eqs(&[('A', 'B'), ('X', 'C')]);
        for strategy in ALL {
            let mut oracle = EqualityOracle::new('A', 'C');
            let expanded = strategy.expand(&kb, &mut oracle, &NullProgressMonitor, true).unwrap();
            assert!(expanded.is_empty(), "{}", strategy);
        }
    }

    #[test]
    fn test_structural_skips_unrelated_statements() {
        let kb = eqs(&[('A', 'B'), ('B', 'C'), ('X', 'Y'), ('Y', 'Z')]);
        let mut oracle = EqualityOracle::new('A', 'C');
        let expanded = ExpansionStrategy::Structural
            .expand(&kb, &mut oracle, &NullProgressMonitor, true)
            .unwrap();
        assert_eq!(expanded, eqs(&[('A', 'B'), ('B', 'C')]));
        assert_eq!(oracle.calls, 1);
    }

    #[test]
    fn test_structural_falls_back_when_signature_is_disconnected() {
        // Nothing mentions the goal symbols directly.
        let kb = eqs(&[('X', 'Y')]);
        let mut oracle = EqualityOracle::new('A', 'C');
        let expanded = ExpansionStrategy::Structural
            .expand(&kb, &mut oracle, &NullProgressMonitor, true)
            .unwrap();
        assert!(expanded.is_empty());
        assert_eq!(oracle.calls, 1);
    }

    #[test]
    fn test_cancelled_expansion_is_empty() {
        let kb = eqs(&[('A', 'B'), ('B', 'C')]);
        let token = CancellationToken::new();
        token.cancel();
        let mut oracle = EqualityOracle::new('A', 'C');
        let expanded = ExpansionStrategy::Structural
            .expand(&kb, &mut oracle, &token, true)
            .unwrap();
        assert!(expanded.is_empty());
        assert_eq!(oracle.calls, 0);
    }
}
