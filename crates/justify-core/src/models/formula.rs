use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use super::statement::Statement;

/// A propositional logic formula.
///
/// Formulas are the statements of the knowledge bases shipped with this
/// crate; atoms are their symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Formula {
    Atom(String),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Biconditional(Box<Formula>, Box<Formula>),
    Contradiction,
}

impl Formula {
    pub fn atom(name: impl Into<String>) -> Self {
        Formula::Atom(name.into())
    }

    pub fn negate(&self) -> Formula {
        Formula::Not(Box::new(self.clone()))
    }

    pub fn and(left: Formula, right: Formula) -> Self {
        Formula::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Formula, right: Formula) -> Self {
        Formula::Or(Box::new(left), Box::new(right))
    }

    pub fn implies(left: Formula, right: Formula) -> Self {
        Formula::Implies(Box::new(left), Box::new(right))
    }

    pub fn iff(left: Formula, right: Formula) -> Self {
        Formula::Biconditional(Box::new(left), Box::new(right))
    }

    /// Get all atomic propositions in the formula
    pub fn atoms(&self) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        self.collect_atoms(&mut result);
        result
    }

    fn collect_atoms(&self, set: &mut BTreeSet<String>) {
        match self {
            Formula::Atom(name) => {
                set.insert(name.clone());
            }
            Formula::Not(inner) => inner.collect_atoms(set),
            Formula::And(left, right)
            | Formula::Or(left, right)
            | Formula::Implies(left, right)
            | Formula::Biconditional(left, right) => {
                left.collect_atoms(set);
                right.collect_atoms(set);
            }
            Formula::Contradiction => {}
        }
    }

    /// Atoms this formula can produce a conclusion about when used as a
    /// premise. An implication only concludes its consequent.
    pub fn concluded_atoms(&self) -> BTreeSet<String> {
        match self {
            Formula::Implies(_, consequent) => consequent.atoms(),
            _ => self.atoms(),
        }
    }

    /// Get the depth (nesting level) of the formula
    pub fn depth(&self) -> usize {
        match self {
            Formula::Atom(_) | Formula::Contradiction => 0,
            Formula::Not(inner) => 1 + inner.depth(),
            Formula::And(left, right)
            | Formula::Or(left, right)
            | Formula::Implies(left, right)
            | Formula::Biconditional(left, right) => 1 + left.depth().max(right.depth()),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Formula::Atom(_) | Formula::Contradiction => 6,
            Formula::Not(_) => 5,
            Formula::And(_, _) => 4,
            Formula::Or(_, _) => 3,
            Formula::Implies(_, _) => 2,
            Formula::Biconditional(_, _) => 1,
        }
    }

    fn write_operand(
        f: &mut fmt::Formatter<'_>,
        inner: &Formula,
        outer: &Formula,
        is_left: bool,
    ) -> fmt::Result {
        // Implication groups to the right, every other binary to the left.
        let right_assoc = matches!(outer, Formula::Implies(_, _));
        let needs_parens = inner.precedence() < outer.precedence()
            || (inner.precedence() == outer.precedence() && is_left == right_assoc);
        if needs_parens {
            write!(f, "({})", inner)
        } else {
            write!(f, "{}", inner)
        }
    }

    /// Parse a formula from a string
    pub fn parse(input: &str) -> Result<Formula, ParseError> {
        if input.chars().count() > MAX_INPUT_CHARS {
            return Err(ParseError::new(
                format!("Formula too long (max {} chars)", MAX_INPUT_CHARS),
                0,
            ));
        }
        FormulaParser::new(input)?.parse()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Atom(name) => write!(f, "{}", name),
            Formula::Contradiction => write!(f, "_|_"),
            Formula::Not(inner) => {
                if inner.precedence() < self.precedence() {
                    write!(f, "~({})", inner)
                } else {
                    write!(f, "~{}", inner)
                }
            }
            Formula::And(l, r)
            | Formula::Or(l, r)
            | Formula::Implies(l, r)
            | Formula::Biconditional(l, r) => {
                let op = match self {
                    Formula::And(_, _) => "&",
                    Formula::Or(_, _) => "|",
                    Formula::Implies(_, _) => "->",
                    _ => "<->",
                };
                Self::write_operand(f, l, self, true)?;
                write!(f, " {} ", op)?;
                Self::write_operand(f, r, self, false)
            }
        }
    }
}

impl Statement for Formula {
    type Symbol = String;

    fn signature(&self) -> BTreeSet<String> {
        self.atoms()
    }

    fn defined_symbols(&self) -> BTreeSet<String> {
        self.concluded_atoms()
    }
}

const MAX_PARSE_DEPTH: usize = 100;
const MAX_INPUT_CHARS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Atom(String),
    Not,
    And,
    Or,
    Implies,
    Iff,
    Bottom,
    Open(char),
    Close(char),
}

/// Operator spellings, longest first so "<->" wins over "->".
const OPERATORS: &[(&str, Token)] = &[
    ("<->", Token::Iff),
    ("<=>", Token::Iff),
    ("_|_", Token::Bottom),
    ("->", Token::Implies),
    ("=>", Token::Implies),
    ("≡", Token::Iff),
    ("⊃", Token::Implies),
    ("⊥", Token::Bottom),
    ("#", Token::Bottom),
    ("¬", Token::Not),
    ("~", Token::Not),
    ("!", Token::Not),
    ("&", Token::And),
    ("·", Token::And),
    ("^", Token::And),
    ("∨", Token::Or),
    ("|", Token::Or),
];

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    'outer: while pos < input.len() {
        let rest = &input[pos..];
        let c = match rest.chars().next() {
            Some(c) => c,
            None => break,
        };
        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }
        for (spelling, token) in OPERATORS {
            if rest.starts_with(*spelling) {
                tokens.push((token.clone(), pos));
                pos += spelling.len();
                continue 'outer;
            }
        }
        match c {
            '(' | '[' | '{' => tokens.push((Token::Open(c), pos)),
            ')' | ']' | '}' => tokens.push((Token::Close(c), pos)),
            _ if c.is_ascii_alphanumeric() || c == '_' => {
                let len = rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '\''))
                    .unwrap_or(rest.len());
                tokens.push((Token::Atom(rest[..len].to_string()), pos));
                pos += len;
                continue;
            }
            _ => return Err(ParseError::new(format!("Unexpected character: '{}'", c), pos)),
        }
        pos += c.len_utf8();
    }
    Ok(tokens)
}

/// Recursive-descent parser over a token stream.
///
/// Precedence from loosest to tightest: `<->`, `->` (right associative),
/// `|`, `&`, `~`.
struct FormulaParser {
    tokens: Vec<(Token, usize)>,
    index: usize,
    depth: usize,
    end: usize,
}

impl FormulaParser {
    fn new(input: &str) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(input)?,
            index: 0,
            depth: 0,
            end: input.len(),
        })
    }

    fn parse(mut self) -> Result<Formula, ParseError> {
        let formula = self.parse_biconditional()?;
        if let Some((_, pos)) = self.tokens.get(self.index) {
            return Err(ParseError::new("Unexpected trailing input", *pos));
        }
        Ok(formula)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.index).map(|(_, p)| *p).unwrap_or(self.end)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if matches!(self.tokens.get(self.index), Some((t, _)) if t == expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(ParseError::new(
                format!("Formula too deeply nested (max {} levels)", MAX_PARSE_DEPTH),
                self.position(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_biconditional(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_implication()?;
        while self.eat(&Token::Iff) {
            let right = self.parse_implication()?;
            left = Formula::iff(left, right);
        }
        Ok(left)
    }

    fn parse_implication(&mut self) -> Result<Formula, ParseError> {
        let left = self.parse_disjunction()?;
        if self.eat(&Token::Implies) {
            self.enter()?;
            let right = self.parse_implication()?;
            self.leave();
            return Ok(Formula::implies(left, right));
        }
        Ok(left)
    }

    fn parse_disjunction(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_conjunction()?;
        while self.eat(&Token::Or) {
            let right = self.parse_conjunction()?;
            left = Formula::or(left, right);
        }
        Ok(left)
    }

    fn parse_conjunction(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_negation()?;
        while self.eat(&Token::And) {
            let right = self.parse_negation()?;
            left = Formula::and(left, right);
        }
        Ok(left)
    }

    fn parse_negation(&mut self) -> Result<Formula, ParseError> {
        if self.eat(&Token::Not) {
            self.enter()?;
            let inner = self.parse_negation()?;
            self.leave();
            return Ok(Formula::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Formula, ParseError> {
        let pos = self.position();
        let token = match self.tokens.get(self.index) {
            Some((token, _)) => token.clone(),
            None => {
                return Err(ParseError::new(
                    "Expected atom, negation, or parenthesized expression",
                    pos,
                ))
            }
        };
        self.index += 1;
        match token {
            Token::Atom(name) => Ok(Formula::Atom(name)),
            Token::Bottom => Ok(Formula::Contradiction),
            Token::Open(open) => {
                self.enter()?;
                let inner = self.parse_biconditional()?;
                let close = match open {
                    '(' => ')',
                    '[' => ']',
                    _ => '}',
                };
                if !self.eat(&Token::Close(close)) {
                    return Err(ParseError::new(
                        format!("Expected closing '{}'", close),
                        self.position(),
                    ));
                }
                self.leave();
                Ok(inner)
            }
            _ => Err(ParseError::new(
                "Expected atom, negation, or parenthesized expression",
                pos,
            )),
        }
    }
}
