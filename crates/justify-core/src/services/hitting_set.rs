//! Enumeration of alternative justifications with a Reiter hitting-set tree.
//!
//! Every node holds a justification. Each of its axioms labels an edge; the
//! child below that edge searches the knowledge base with every edge axiom
//! on its path removed. Branches are searched on their own reduced copy of
//! the knowledge base, so nothing is restored on the way back up.

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Justification, SearchStats, Statement, StatementSet};
use crate::services::monitor::ProgressMonitor;
use crate::services::oracle::EntailmentOracle;
use crate::services::search::JustificationSearch;

/// Why a build stopped before the queue ran dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    Cancelled,
    LimitReached,
}

/// Justifications collected by one search, in discovery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanations<E, S: Ord> {
    pub justifications: Vec<Justification<E, S>>,
    /// The monitor stopped the search; the list may be incomplete
    pub cancelled: bool,
    /// The search stopped because it reached the caller's limit
    pub limit_reached: bool,
    pub stats: SearchStats,
}

impl<E, S: Statement> Explanations<E, S> {
    pub fn empty() -> Self {
        Self {
            justifications: Vec::new(),
            cancelled: false,
            limit_reached: false,
            stats: SearchStats::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.justifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.justifications.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Justification<E, S>> + '_ {
        self.justifications.iter()
    }

    /// Whether some justification has exactly these axioms
    pub fn contains_axioms(&self, axioms: &StatementSet<S>) -> bool {
        self.justifications.iter().any(|j| j.axioms() == axioms)
    }

    /// Whether the list is known to hold every justification
    pub fn is_complete(&self) -> bool {
        !self.cancelled && !self.limit_reached
    }
}

impl<E: Eq + std::hash::Hash, S: Statement> Explanations<E, S> {
    pub fn into_set(self) -> HashSet<Justification<E, S>> {
        self.justifications.into_iter().collect()
    }
}

#[derive(Debug)]
struct Node<S: Ord> {
    /// Index into the found justifications
    justification: usize,
    /// Edge axioms from the root down to this node
    path: StatementSet<S>,
}

/// State of one tree build. Discarded when the build returns.
pub struct HittingSetTree<'a, E, S: Statement> {
    search: &'a JustificationSearch,
    kb: &'a StatementSet<S>,
    limit: usize,
    order_by_frequency: bool,
    nodes: Vec<Node<S>>,
    found: Vec<Justification<E, S>>,
    found_index: HashMap<StatementSet<S>, usize>,
    explored_paths: HashSet<StatementSet<S>>,
    closed_paths: Vec<StatementSet<S>>,
    stats: SearchStats,
}

impl<'a, E: Clone, S: Statement> HittingSetTree<'a, E, S> {
    pub fn new(search: &'a JustificationSearch, kb: &'a StatementSet<S>, limit: usize, order_by_frequency: bool) -> Self {
        Self {
            search,
            kb,
            limit,
            order_by_frequency,
            nodes: Vec::new(),
            found: Vec::new(),
            found_index: HashMap::new(),
            explored_paths: HashSet::new(),
            closed_paths: Vec::new(),
            stats: SearchStats::new(),
        }
    }

    /// Enumerate up to `limit` justifications, breadth first.
    ///
    /// Oracle failures and invariant violations abort the build with an
    /// error. Cancellation and the limit end it early with what was found.
    pub fn build<O, M>(mut self, oracle: &mut O, monitor: &mut M) -> Result<Explanations<E, S>>
    where
        O: EntailmentOracle<S, Entailment = E> + ?Sized,
        M: ProgressMonitor<E, S> + ?Sized,
    {
        info!(kb = self.kb.len(), limit = self.limit, "building hitting set tree");
        let calls_before = oracle.call_count();

        let outcome = self.run(oracle, monitor)?;

        self.stats.oracle_calls = oracle.call_count().saturating_sub(calls_before);
        self.stats.finish();
        info!(
            found = self.found.len(),
            nodes = self.stats.nodes,
            oracle_calls = self.stats.oracle_calls,
            reused = self.stats.reused_justifications,
            closed_paths = self.stats.closed_paths,
            outcome = ?outcome,
            "hitting set tree finished"
        );

        Ok(Explanations {
            justifications: self.found,
            cancelled: outcome == ControlFlow::Break(Halt::Cancelled),
            limit_reached: outcome == ControlFlow::Break(Halt::LimitReached),
            stats: self.stats,
        })
    }

    fn run<O, M>(&mut self, oracle: &mut O, monitor: &mut M) -> Result<ControlFlow<Halt>>
    where
        O: EntailmentOracle<S, Entailment = E> + ?Sized,
        M: ProgressMonitor<E, S> + ?Sized,
    {
        if self.limit == 0 {
            return Ok(ControlFlow::Continue(()));
        }
        if monitor.is_cancelled() {
            return Ok(ControlFlow::Break(Halt::Cancelled));
        }
        // A goal that holds without any axiom has no minimal non-empty justification.
        // Divide-and-conquer contraction assumes the empty set does not entail and
        // would return a non-minimal singleton here, so this check must stay.
        if oracle.is_entailed(&StatementSet::new())? {
            debug!("entailment holds over the empty set");
            return Ok(ControlFlow::Continue(()));
        }

        let root = self.search.find_one(self.kb, oracle, &*monitor)?;
        self.stats.find_one_calls += 1;
        if monitor.is_cancelled() {
            return Ok(ControlFlow::Break(Halt::Cancelled));
        }
        if root.is_empty() {
            debug!("entailment does not hold");
            return Ok(ControlFlow::Continue(()));
        }

        let root_index = self.record(root, monitor);
        self.nodes.push(Node {
            justification: root_index,
            path: StatementSet::new(),
        });
        self.stats.nodes += 1;
        if self.found.len() >= self.limit {
            return Ok(ControlFlow::Break(Halt::LimitReached));
        }

        let mut queue = VecDeque::from([0usize]);
        while let Some(node) = queue.pop_front() {
            if let ControlFlow::Break(halt) = self.expand(node, &mut queue, oracle, monitor)? {
                return Ok(ControlFlow::Break(halt));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn expand<O, M>(
        &mut self,
        node: usize,
        queue: &mut VecDeque<usize>,
        oracle: &mut O,
        monitor: &mut M,
    ) -> Result<ControlFlow<Halt>>
    where
        O: EntailmentOracle<S, Entailment = E> + ?Sized,
        M: ProgressMonitor<E, S> + ?Sized,
    {
        if monitor.is_cancelled() {
            return Ok(ControlFlow::Break(Halt::Cancelled));
        }
        let node_path = self.nodes[node].path.clone();
        let axioms = self.branch_order(self.nodes[node].justification);
        debug!(node, depth = node_path.len(), branches = axioms.len(), "expanding node");

        for axiom in axioms {
            if monitor.is_cancelled() {
                return Ok(ControlFlow::Break(Halt::Cancelled));
            }
            let path = node_path.with(axiom.clone());

            // Removing a superset of a closed path cannot bring the entailment back.
            if self.closed_paths.iter().any(|closed| closed.is_subset(&path)) {
                self.stats.early_terminated_paths += 1;
                continue;
            }
            if !self.explored_paths.insert(path.clone()) {
                self.stats.early_terminated_paths += 1;
                continue;
            }
            self.stats.record_explored_path(path.len());

            let (justification, is_new) = match self.reusable(&path) {
                Some(index) => {
                    self.stats.reused_justifications += 1;
                    (index, false)
                }
                None => {
                    let working = self.kb.difference(&path);
                    let found = self.search.find_one(&working, oracle, &*monitor)?;
                    self.stats.find_one_calls += 1;
                    if monitor.is_cancelled() {
                        return Ok(ControlFlow::Break(Halt::Cancelled));
                    }
                    if found.is_empty() {
                        self.stats.record_closed_path(path.len());
                        self.closed_paths.push(path);
                        continue;
                    }
                    if !found.axioms().is_disjoint(&path) {
                        return Err(Error::InvariantViolation(format!(
                            "justification contains an axiom removed on the current path: {:?}",
                            found.axioms().intersection(&path)
                        )));
                    }
                    let known = self.found_index.get(found.axioms()).copied();
                    match known {
                        Some(index) => (index, false),
                        None => (self.record(found, monitor), true),
                    }
                }
            };

            let child = self.nodes.len();
            self.nodes.push(Node { justification, path });
            self.stats.nodes += 1;
            queue.push_back(child);

            if is_new && self.found.len() >= self.limit {
                return Ok(ControlFlow::Break(Halt::LimitReached));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Add a new justification to the results and report it.
    fn record<M>(&mut self, justification: Justification<E, S>, monitor: &mut M) -> usize
    where
        M: ProgressMonitor<E, S> + ?Sized,
    {
        let index = self.found.len();
        self.found_index.insert(justification.axioms().clone(), index);
        self.found.push(justification);
        monitor.found_justification(&self.found[index], &self.found);
        index
    }

    /// The smallest found justification untouched by `path`, still valid with
    /// `path` removed.
    fn reusable(&self, path: &StatementSet<S>) -> Option<usize> {
        self.found
            .iter()
            .enumerate()
            .filter(|(_, j)| j.axioms().is_disjoint(path))
            .min_by_key(|(index, j)| (j.len(), *index))
            .map(|(index, _)| index)
    }

    /// Axioms of a justification in branching order.
    ///
    /// With frequency ordering, axioms shared by more found justifications
    /// come first; ties keep set order.
    fn branch_order(&self, justification: usize) -> Vec<S> {
        let mut axioms = self.found[justification].axioms().to_vec();
        if self.order_by_frequency {
            let mut frequency: HashMap<&S, usize> = HashMap::new();
            for j in &self.found {
                for axiom in j.axioms() {
                    *frequency.entry(axiom).or_default() += 1;
                }
            }
            axioms.sort_by_key(|axiom| std::cmp::Reverse(frequency.get(axiom).copied().unwrap_or(0)));
        }
        axioms
    }
}
