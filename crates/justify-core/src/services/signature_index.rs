use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Statement, StatementSet};

/// Maps symbols to the statements that mention them.
#[derive(Debug, Clone)]
pub struct SignatureIndex<S: Statement> {
    /// Maps each symbol to the statements whose signature contains it
    referencing: BTreeMap<S::Symbol, BTreeSet<S>>,
    /// Maps each symbol to the statements that define it
    defining: BTreeMap<S::Symbol, BTreeSet<S>>,
}

impl<S: Statement> SignatureIndex<S> {
    pub fn build(statements: &StatementSet<S>) -> Self {
        let mut referencing: BTreeMap<S::Symbol, BTreeSet<S>> = BTreeMap::new();
        let mut defining: BTreeMap<S::Symbol, BTreeSet<S>> = BTreeMap::new();

        for statement in statements {
            for symbol in statement.signature() {
                referencing.entry(symbol).or_default().insert(statement.clone());
            }
            for symbol in statement.defined_symbols() {
                defining.entry(symbol).or_default().insert(statement.clone());
            }
        }

        Self {
            referencing,
            defining,
        }
    }

    /// Statements mentioning `symbol`
    pub fn referencing(&self, symbol: &S::Symbol) -> impl Iterator<Item = &S> + '_ {
        self.referencing.get(symbol).into_iter().flatten()
    }

    /// Statements mentioning any of `symbols`
    pub fn referencing_any<'a>(&self, symbols: impl IntoIterator<Item = &'a S::Symbol>) -> StatementSet<S>
    where
        S::Symbol: 'a,
    {
        symbols
            .into_iter()
            .filter_map(|symbol| self.referencing.get(symbol))
            .flatten()
            .cloned()
            .collect()
    }

    /// Statements defining any of `symbols`
    pub fn defining_any<'a>(&self, symbols: impl IntoIterator<Item = &'a S::Symbol>) -> StatementSet<S>
    where
        S::Symbol: 'a,
    {
        symbols
            .into_iter()
            .filter_map(|symbol| self.defining.get(symbol))
            .flatten()
            .cloned()
            .collect()
    }

    /// Partition into groups connected through shared symbols.
    ///
    /// Statements with an empty signature form singleton groups. Groups come
    /// out ordered by their smallest statement.
    pub fn connected_components(&self, statements: &StatementSet<S>) -> Vec<StatementSet<S>> {
        let mut seen: BTreeSet<&S> = BTreeSet::new();
        let mut components = Vec::new();

        for start in statements {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start.clone()];
            let mut to_visit = vec![start];

            while let Some(current) = to_visit.pop() {
                for symbol in current.signature() {
                    for neighbour in self.referencing(&symbol) {
                        if statements.contains(neighbour) && seen.insert(neighbour) {
                            component.push(neighbour.clone());
                            to_visit.push(neighbour);
                        }
                    }
                }
            }

            components.push(StatementSet::from(component));
        }

        components
    }
}
