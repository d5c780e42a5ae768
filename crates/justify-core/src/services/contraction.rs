use tracing::debug;

use crate::error::Result;
use crate::models::{ContractionStrategy, Statement, StatementSet};
use crate::services::monitor::ProgressMonitor;
use crate::services::oracle::EntailmentOracle;

impl ContractionStrategy {
    /// Shrink an entailing set to a minimal entailing subset.
    ///
    /// On return, removing any single statement breaks entailment, unless the
    /// monitor cancelled part way, in which case the result is only entailing.
    pub fn contract<S, O, M>(
        &self,
        entailing: &StatementSet<S>,
        oracle: &mut O,
        monitor: &M,
        window_divisor: usize,
    ) -> Result<StatementSet<S>>
    where
        S: Statement,
        O: EntailmentOracle<S> + ?Sized,
        M: ProgressMonitor<O::Entailment, S> + ?Sized,
    {
        let contracted = match self {
            ContractionStrategy::Simple => contract_linear(entailing.clone(), oracle, monitor)?,
            ContractionStrategy::Windowed => {
                let windowed = contract_windows(entailing, oracle, monitor, window_divisor)?;
                contract_linear(windowed, oracle, monitor)?
            }
            ContractionStrategy::DivideAndConquer => {
                let candidates = entailing.to_vec();
                let minimal = divide_and_conquer(&StatementSet::new(), false, &candidates, oracle, monitor)?;
                StatementSet::from(minimal)
            }
        };
        debug!(strategy = %self, input = entailing.len(), output = contracted.len(), "contracted");
        Ok(contracted)
    }
}

/// Drop statements one at a time, keeping each removal that preserves entailment.
fn contract_linear<S, O, M>(mut current: StatementSet<S>, oracle: &mut O, monitor: &M) -> Result<StatementSet<S>>
where
    S: Statement,
    O: EntailmentOracle<S> + ?Sized,
    M: ProgressMonitor<O::Entailment, S> + ?Sized,
{
    for statement in current.to_vec() {
        if monitor.is_cancelled() {
            break;
        }
        let candidate = current.without(&statement);
        if oracle.is_entailed(&candidate)? {
            current = candidate;
        }
    }
    Ok(current)
}

/// One pass of window removal; a successful removal also recomputes the module.
fn contract_windows<S, O, M>(
    entailing: &StatementSet<S>,
    oracle: &mut O,
    monitor: &M,
    window_divisor: usize,
) -> Result<StatementSet<S>>
where
    S: Statement,
    O: EntailmentOracle<S> + ?Sized,
    M: ProgressMonitor<O::Entailment, S> + ?Sized,
{
    let statements = entailing.to_vec();
    let window = (statements.len() / window_divisor.max(1)).max(1);
    let mut current = entailing.clone();

    for chunk in statements.chunks(window) {
        if monitor.is_cancelled() {
            break;
        }
        let removal: StatementSet<S> = chunk.iter().filter(|s| current.contains(s)).cloned().collect();
        if removal.is_empty() {
            continue;
        }
        let candidate = current.difference(&removal);
        if oracle.is_entailed(&candidate)? {
            current = oracle.module(&candidate);
        }
    }
    Ok(current)
}

/// Minimal subset `D` of `candidates` such that `background ∪ D` entails.
///
/// Requires `background ∪ candidates` to entail. `background_changed` is
/// false when `background` was already known not to entail on its own.
fn divide_and_conquer<S, O, M>(
    background: &StatementSet<S>,
    background_changed: bool,
    candidates: &[S],
    oracle: &mut O,
    monitor: &M,
) -> Result<Vec<S>>
where
    S: Statement,
    O: EntailmentOracle<S> + ?Sized,
    M: ProgressMonitor<O::Entailment, S> + ?Sized,
{
    if monitor.is_cancelled() {
        return Ok(candidates.to_vec());
    }
    if background_changed && oracle.is_entailed(background)? {
        return Ok(Vec::new());
    }
    if candidates.len() <= 1 {
        return Ok(candidates.to_vec());
    }

    let (left, right) = candidates.split_at(candidates.len() / 2);

    let with_left = background.union(&left.iter().cloned().collect());
    let from_right = divide_and_conquer(&with_left, true, right, oracle, monitor)?;

    let with_right = background.union(&from_right.iter().cloned().collect());
    let from_left = divide_and_conquer(&with_right, !from_right.is_empty(), left, oracle, monitor)?;

    let mut result = from_left;
    result.extend(from_right);
    Ok(result)
}
