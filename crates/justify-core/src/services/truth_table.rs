use crate::models::Formula;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Hard ceiling on table width: 2^24 rows is 256K words (2 MB) per table.
pub const ABSOLUTE_MAX_ATOMS: usize = 24;

/// Bit patterns for the low six variables within one 64-row word.
const LOW_PATTERNS: [u64; 6] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{atoms} distinct atoms exceed the truth table limit of {max}")]
pub struct TooManyAtoms {
    pub atoms: usize,
    pub max: usize,
}

// ─── Truth table bitvector ───────────────────────────────────────────────────

/// Truth table backed by a Vec<u64> bitvector.
/// Row `r` assigns variable `i` the value of bit `i` of `r`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    bits: Vec<u64>,
    num_vars: u8,
}

impl TruthTable {
    /// Number of u64 words needed for `n` variables.
    fn words(num_vars: u8) -> usize {
        let rows = 1u64 << num_vars;
        ((rows + 63) / 64) as usize
    }

    /// Mask for the final word when there are fewer than 64 rows.
    fn tail_mask(num_vars: u8) -> u64 {
        if num_vars >= 6 {
            !0
        } else {
            (1u64 << (1u64 << num_vars)) - 1
        }
    }

    fn masked(mut bits: Vec<u64>, num_vars: u8) -> Self {
        if let Some(last) = bits.last_mut() {
            *last &= Self::tail_mask(num_vars);
        }
        Self { bits, num_vars }
    }

    pub fn constant(value: bool, num_vars: u8) -> Self {
        let word = if value { !0 } else { 0 };
        Self::masked(vec![word; Self::words(num_vars)], num_vars)
    }

    /// The table of variable `index` among `num_vars` variables.
    pub fn variable(index: u8, num_vars: u8) -> Self {
        debug_assert!(index < num_vars);
        let bits = (0..Self::words(num_vars))
            .map(|w| {
                if index < 6 {
                    LOW_PATTERNS[index as usize]
                } else if (w >> (index - 6)) & 1 == 1 {
                    !0
                } else {
                    0
                }
            })
            .collect();
        Self::masked(bits, num_vars)
    }

    pub fn num_vars(&self) -> u8 {
        self.num_vars
    }

    pub fn not(&self) -> Self {
        Self::masked(self.bits.iter().map(|w| !w).collect(), self.num_vars)
    }

    fn zip_with(&self, other: &Self, op: impl Fn(u64, u64) -> u64) -> Self {
        debug_assert_eq!(self.num_vars, other.num_vars);
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| op(*a, *b))
            .collect();
        Self::masked(bits, self.num_vars)
    }

    pub fn and(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a & b)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a | b)
    }

    pub fn implies(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| !a | b)
    }

    pub fn biconditional(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| !(a ^ b))
    }

    pub fn is_contradiction(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    pub fn is_tautology(&self) -> bool {
        *self == Self::constant(true, self.num_vars)
    }

    /// Value at `row`, where bit `i` of `row` is the value of variable `i`.
    pub fn row(&self, row: u64) -> bool {
        let word = (row / 64) as usize;
        self.bits.get(word).map_or(false, |w| (w >> (row % 64)) & 1 == 1)
    }

    /// Number of satisfying rows
    pub fn models(&self) -> u64 {
        self.bits.iter().map(|w| w.count_ones() as u64).sum()
    }
}

// ─── Evaluation over a shared variable ordering ──────────────────────────────

/// Evaluates formulas over one fixed, sorted atom ordering.
#[derive(Debug)]
pub struct Evaluator {
    num_vars: u8,
    variables: HashMap<String, TruthTable>,
}

impl Evaluator {
    pub fn new<'a>(formulas: impl IntoIterator<Item = &'a Formula>, max_atoms: usize) -> Result<Self, TooManyAtoms> {
        let atoms: BTreeSet<String> = formulas.into_iter().flat_map(|f| f.atoms()).collect();
        let max = max_atoms.min(ABSOLUTE_MAX_ATOMS);
        if atoms.len() > max {
            return Err(TooManyAtoms { atoms: atoms.len(), max });
        }
        let num_vars = atoms.len() as u8;
        let variables = atoms
            .into_iter()
            .enumerate()
            .map(|(i, atom)| (atom, TruthTable::variable(i as u8, num_vars)))
            .collect();
        Ok(Self { num_vars, variables })
    }

    pub fn num_vars(&self) -> u8 {
        self.num_vars
    }

    pub fn eval(&self, formula: &Formula) -> TruthTable {
        match formula {
            // Atoms outside the ordering are never produced by `new`; treat them as free-true.
            Formula::Atom(name) => self
                .variables
                .get(name)
                .cloned()
                .unwrap_or_else(|| TruthTable::constant(true, self.num_vars)),
            Formula::Not(inner) => self.eval(inner).not(),
            Formula::And(l, r) => self.eval(l).and(&self.eval(r)),
            Formula::Or(l, r) => self.eval(l).or(&self.eval(r)),
            Formula::Implies(l, r) => self.eval(l).implies(&self.eval(r)),
            Formula::Biconditional(l, r) => self.eval(l).biconditional(&self.eval(r)),
            Formula::Contradiction => TruthTable::constant(false, self.num_vars),
        }
    }

    /// Conjunction of all formulas; stops early once no row survives.
    pub fn conjunction<'a>(&self, formulas: impl IntoIterator<Item = &'a Formula>) -> TruthTable {
        let mut acc = TruthTable::constant(true, self.num_vars);
        for formula in formulas {
            acc = acc.and(&self.eval(formula));
            if acc.is_contradiction() {
                break;
            }
        }
        acc
    }
}

// === Semantic Checks ===

/// Check if premises semantically entail a conclusion
pub fn entails<'a, I>(premises: I, conclusion: &'a Formula, max_atoms: usize) -> Result<bool, TooManyAtoms>
where
    I: IntoIterator<Item = &'a Formula> + Clone,
{
    let evaluator = Evaluator::new(premises.clone().into_iter().chain(std::iter::once(conclusion)), max_atoms)?;
    let combined = evaluator.conjunction(premises);
    if combined.is_contradiction() {
        return Ok(true);
    }
    // Counterexample = row where premises true but conclusion false
    Ok(combined.and(&evaluator.eval(conclusion).not()).is_contradiction())
}

/// Check if a set of formulas has a model
pub fn is_satisfiable<'a, I>(formulas: I, max_atoms: usize) -> Result<bool, TooManyAtoms>
where
    I: IntoIterator<Item = &'a Formula> + Clone,
{
    let evaluator = Evaluator::new(formulas.clone(), max_atoms)?;
    Ok(!evaluator.conjunction(formulas).is_contradiction())
}

pub fn is_tautology(formula: &Formula, max_atoms: usize) -> Result<bool, TooManyAtoms> {
    let evaluator = Evaluator::new(std::iter::once(formula), max_atoms)?;
    Ok(evaluator.eval(formula).is_tautology())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Formula {
        Formula::parse(s).unwrap()
    }

    fn parse_all(input: &[&str]) -> Vec<Formula> {
        input.iter().map(|s| parse(s)).collect()
    }

    #[test]
    fn test_variable_tables() {
        let p = TruthTable::variable(0, 2);
        let q = TruthTable::variable(1, 2);
        // Rows 0..4: p = 0,1,0,1  q = 0,0,1,1
        assert_eq!(p.bits, vec![0b1010]);
        assert_eq!(q.bits, vec![0b1100]);
        assert_eq!(p.and(&q).models(), 1);
        assert_eq!(p.or(&q).models(), 3);
    }

    #[test]
    fn test_high_variables_span_words() {
        let v = TruthTable::variable(7, 8);
        assert_eq!(v.bits, vec![0, 0, !0, !0]);
        assert_eq!(v.models(), 128);
    }

    #[test]
    fn test_row_lookup() {
        let p_implies_q = TruthTable::variable(0, 2).implies(&TruthTable::variable(1, 2));
        // Only row 1 (p true, q false) is false.
        assert!(p_implies_q.row(0));
        assert!(!p_implies_q.row(1));
        assert!(p_implies_q.row(2));
        assert!(p_implies_q.row(3));

        let high = TruthTable::variable(7, 8);
        assert!(!high.row(127));
        assert!(high.row(128));
    }

    #[test]
    fn test_negation_respects_row_count() {
        let t = TruthTable::constant(false, 1).not();
        assert_eq!(t.bits, vec![0b11]);
        assert!(t.is_tautology());
    }

    #[test]
    fn test_zero_atoms() {
        assert!(is_tautology(&parse("~_|_"), 20).unwrap());
        assert!(!is_satisfiable(&[Formula::Contradiction], 20).unwrap());
    }

    #[test]
    fn test_modus_ponens() {
        let premises = parse_all(&["P", "P -> Q"]);
        assert!(entails(&premises, &parse("Q"), 20).unwrap());
        assert!(!entails(&premises[..1], &parse("Q"), 20).unwrap());
    }

    #[test]
    fn test_hypothetical_syllogism() {
        let premises = parse_all(&["P -> Q", "Q -> R"]);
        assert!(entails(&premises, &parse("P -> R"), 20).unwrap());
        assert!(!entails(&premises, &parse("R -> P"), 20).unwrap());
    }

    #[test]
    fn test_inconsistent_premises_entail_anything() {
        let premises = parse_all(&["P", "~P"]);
        assert!(!is_satisfiable(&premises, 20).unwrap());
        assert!(entails(&premises, &parse("Z"), 20).unwrap());
    }

    #[test]
    fn test_tautology() {
        assert!(is_tautology(&parse("P | ~P"), 20).unwrap());
        assert!(is_tautology(&parse("(P -> Q) <-> (~Q -> ~P)"), 20).unwrap());
        assert!(!is_tautology(&parse("P -> Q"), 20).unwrap());
    }

    #[test]
    fn test_many_atoms() {
        let chain: Vec<Formula> = (0..9).map(|i| parse(&format!("A{} -> A{}", i, i + 1))).collect();
        assert!(entails(&chain, &parse("A0 -> A9"), 20).unwrap());
    }

    #[test]
    fn test_atom_limit() {
        let premises = parse_all(&["A & B & C"]);
        let err = entails(&premises, &parse("D"), 3).unwrap_err();
        assert_eq!(err, TooManyAtoms { atoms: 4, max: 3 });
    }
}
