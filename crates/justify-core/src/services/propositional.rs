use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Formula, Statement, StatementSet};
use crate::services::oracle::EntailmentOracle;
use crate::services::signature_index::SignatureIndex;
use crate::services::truth_table;

pub const DEFAULT_MAX_ATOMS: usize = 20;

/// Classical entailment between propositional formulas, by truth tables.
///
/// Premise sets are split into atom-connected components first. A set
/// entails the goal when one of its components is unsatisfiable or when the
/// components sharing an atom with the goal entail it. Those components are
/// tried one at a time; when none entails alone, every valuation of the
/// goal's atoms that falsifies the goal must be ruled out by some single
/// component. No table is ever wider than one component plus the goal.
#[derive(Debug, Clone)]
pub struct PropositionalOracle {
    goal: Formula,
    max_atoms: usize,
    time_budget: Option<Duration>,
    spent: Duration,
    calls: u64,
    /// Last entailing input and the smallest component group that entails
    last_entailing: Option<(StatementSet<Formula>, StatementSet<Formula>)>,
}

impl PropositionalOracle {
    pub fn new(goal: Formula) -> Self {
        Self {
            goal,
            max_atoms: DEFAULT_MAX_ATOMS,
            time_budget: None,
            spent: Duration::ZERO,
            calls: 0,
            last_entailing: None,
        }
    }

    /// Explains why a premise set is inconsistent: the goal is ⊥.
    pub fn inconsistency() -> Self {
        Self::new(Formula::Contradiction)
    }

    pub fn with_max_atoms(mut self, max_atoms: usize) -> Self {
        self.max_atoms = max_atoms;
        self
    }

    /// Cumulative time after which further calls fail with a timeout.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn goal(&self) -> &Formula {
        &self.goal
    }

    pub fn time_spent(&self) -> Duration {
        self.spent
    }

    fn touches_goal(&self, component: &StatementSet<Formula>) -> bool {
        let goal_atoms = self.goal.atoms();
        component.iter().any(|f| !f.atoms().is_disjoint(&goal_atoms))
    }

    fn components(axioms: &StatementSet<Formula>) -> Vec<StatementSet<Formula>> {
        SignatureIndex::build(axioms).connected_components(axioms)
    }

    fn satisfiable(&self, component: &StatementSet<Formula>) -> Result<bool> {
        truth_table::is_satisfiable(component, self.max_atoms)
            .map_err(|e| Error::oracle_failure_with_source("premise component too large for a truth table", e))
    }

    fn component_entails(&self, component: &StatementSet<Formula>) -> Result<bool> {
        truth_table::entails(component, &self.goal, self.max_atoms)
            .map_err(|e| Error::oracle_failure_with_source("goal component too large for a truth table", e))
    }

    /// Whether atom-disjoint components entail the goal together.
    fn jointly_entail(&self, components: &[StatementSet<Formula>]) -> Result<bool> {
        let goal_atoms: Vec<String> = self.goal.atoms().into_iter().collect();
        let goal_table = truth_table::Evaluator::new(std::iter::once(&self.goal), self.max_atoms)
            .map_err(|e| Error::oracle_failure_with_source("goal too large for a truth table", e))?
            .eval(&self.goal);

        for row in (0..1u64 << goal_atoms.len()).filter(|row| !goal_table.row(*row)) {
            let mut ruled_out = false;
            for component in components {
                let atoms = component.signature();
                let literals: Vec<Formula> = goal_atoms
                    .iter()
                    .enumerate()
                    .filter(|(_, atom)| atoms.contains(*atom))
                    .map(|(i, atom)| {
                        let literal = Formula::atom(atom.clone());
                        if (row >> i) & 1 == 1 {
                            literal
                        } else {
                            literal.negate()
                        }
                    })
                    .collect();
                let consistent = truth_table::is_satisfiable(component.into_iter().chain(literals.iter()), self.max_atoms)
                    .map_err(|e| Error::oracle_failure_with_source("goal component too large for a truth table", e))?;
                if !consistent {
                    ruled_out = true;
                    break;
                }
            }
            // This valuation extends to a countermodel of every component.
            if !ruled_out {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The entailing part of `axioms`, or None if the goal does not follow.
    fn decide(&self, axioms: &StatementSet<Formula>) -> Result<Option<StatementSet<Formula>>> {
        let (touching, other): (Vec<_>, Vec<_>) = Self::components(axioms)
            .into_iter()
            .partition(|c| self.touches_goal(c));

        for component in &touching {
            if self.component_entails(component)? {
                return Ok(Some(component.clone()));
            }
        }
        // With exactly one touching component the check above was already exact.
        if touching.len() != 1 && self.jointly_entail(&touching)? {
            return Ok(Some(touching.into_iter().flatten().collect()));
        }
        for component in other {
            if !self.satisfiable(&component)? {
                return Ok(Some(component));
            }
        }
        Ok(None)
    }

    fn check_budget(&self) -> Result<()> {
        match self.time_budget {
            Some(budget) if self.spent >= budget => {
                let elapsed_ms = self.spent.as_millis() as u64;
                warn!(elapsed_ms, budget_ms = budget.as_millis() as u64, "entailment oracle out of time");
                Err(Error::OracleTimeout { elapsed_ms })
            }
            _ => Ok(()),
        }
    }
}

impl EntailmentOracle<Formula> for PropositionalOracle {
    type Entailment = Formula;

    fn entailment(&self) -> &Formula {
        &self.goal
    }

    fn is_entailed(&mut self, axioms: &StatementSet<Formula>) -> Result<bool> {
        self.check_budget()?;
        self.calls += 1;
        let started = Instant::now();
        let decided = self.decide(axioms);
        self.spent += started.elapsed();

        match decided? {
            Some(witness) => {
                self.last_entailing = Some((axioms.clone(), witness));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Components that share an atom with the goal, plus components that
    /// are unsatisfiable on their own.
    fn module(&self, axioms: &StatementSet<Formula>) -> StatementSet<Formula> {
        Self::components(axioms)
            .into_iter()
            // A component too wide to check stays in; the module may over-approximate.
            .filter(|c| self.touches_goal(c) || !self.satisfiable(c).unwrap_or(false))
            .flatten()
            .collect()
    }

    fn entailment_signature(&self) -> BTreeSet<String> {
        self.goal.signature()
    }

    fn entailing_axioms(&self, axioms: &StatementSet<Formula>) -> StatementSet<Formula> {
        match &self.last_entailing {
            Some((input, witness)) if input == axioms => witness.clone(),
            _ => self.module(axioms),
        }
    }

    fn call_count(&self) -> u64 {
        self.calls
    }

    fn reset_call_count(&mut self) {
        self.calls = 0;
    }
}
