use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Formula, StatementSet};

/// Shape of a generated knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbSpec {
    /// Independent implication chains from the source to the target atom
    pub chains: usize,
    /// Implications per chain
    pub chain_length: usize,
    /// Unrelated premises mixed in
    pub noise: usize,
}

/// A knowledge base whose justifications are known in advance.
#[derive(Debug, Clone)]
pub struct GeneratedKb {
    pub premises: StatementSet<Formula>,
    pub conclusion: Formula,
    /// One justification per chain: the source fact plus the chain
    pub planted: Vec<StatementSet<Formula>>,
}

/// Builds random knowledge bases with planted justifications.
pub struct KbGenerator {
    spec: KbSpec,
}

const SOURCE: &str = "S";
const TARGET: &str = "T";

impl KbGenerator {
    pub fn new(spec: KbSpec) -> Result<Self> {
        if spec.chains == 0 {
            return Err(Error::Config("chains must be at least 1".into()));
        }
        if spec.chain_length == 0 {
            return Err(Error::Config("chain_length must be at least 1".into()));
        }
        if spec.chains > 1 && spec.chain_length == 1 {
            return Err(Error::Config(
                "chains of length 1 all collapse to the same premise".into(),
            ));
        }
        Ok(Self { spec })
    }

    pub fn generate(&self, rng: &mut impl Rng) -> GeneratedKb {
        let source = Formula::atom(SOURCE);
        let conclusion = Formula::atom(TARGET);

        let planted: Vec<StatementSet<Formula>> = (0..self.spec.chains)
            .map(|chain| self.chain(chain, &source, &conclusion).with(source.clone()))
            .collect();

        let mut premises: StatementSet<Formula> = planted.iter().flatten().cloned().collect();
        let noise_atoms = self.noise_atoms();
        let mut attempts = 0;
        while premises.len() < self.spec.chains * self.spec.chain_length + 1 + self.spec.noise
            && attempts < self.spec.noise * 10
        {
            attempts += 1;
            premises = premises.with(Self::random_noise(&noise_atoms, rng));
        }

        GeneratedKb {
            premises,
            conclusion,
            planted,
        }
    }

    /// `S -> C{i}_1, C{i}_1 -> C{i}_2, ..., C{i}_{n-1} -> T`
    fn chain(&self, index: usize, source: &Formula, target: &Formula) -> StatementSet<Formula> {
        let mut links = Vec::with_capacity(self.spec.chain_length + 1);
        links.push(source.clone());
        for step in 1..self.spec.chain_length {
            links.push(Formula::atom(format!("C{}_{}", index, step)));
        }
        links.push(target.clone());
        links
            .windows(2)
            .map(|pair| Formula::implies(pair[0].clone(), pair[1].clone()))
            .collect()
    }

    fn noise_atoms(&self) -> Vec<Formula> {
        let count = (self.spec.noise / 2).max(2);
        (0..count).map(|i| Formula::atom(format!("N{}", i))).collect()
    }

    /// Negation-free: the all-true valuation satisfies every noise premise.
    fn random_noise(atoms: &[Formula], rng: &mut impl Rng) -> Formula {
        let fallback = Formula::atom("N0");
        let a = atoms.choose(&mut *rng).unwrap_or(&fallback).clone();
        let b = atoms.choose(&mut *rng).unwrap_or(&fallback).clone();
        match rng.gen_range(0..4) {
            0 => a,
            1 => Formula::implies(a, b),
            2 => Formula::or(a, b),
            _ => Formula::and(a, b),
        }
    }
}
