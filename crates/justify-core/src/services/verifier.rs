use std::collections::HashSet;

use crate::error::Result;
use crate::models::{Justification, Statement};
use crate::services::hitting_set::Explanations;
use crate::services::oracle::EntailmentOracle;

/// Result of justification verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl VerificationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Re-checks justifications against an oracle
pub struct JustificationVerifier;

impl JustificationVerifier {
    /// Check that the axioms entail and that every axiom is needed.
    pub fn verify<S, O>(justification: &Justification<O::Entailment, S>, oracle: &mut O) -> Result<VerificationResult>
    where
        S: Statement,
        O: EntailmentOracle<S> + ?Sized,
    {
        if justification.entailment() != oracle.entailment() {
            return Ok(VerificationResult::invalid(format!(
                "Justification is for {:?}, oracle decides {:?}",
                justification.entailment(),
                oracle.entailment()
            )));
        }
        if justification.is_empty() {
            return Ok(VerificationResult::invalid("Justification has no axioms"));
        }
        if !oracle.is_entailed(justification.axioms())? {
            return Ok(VerificationResult::invalid("Axioms do not entail the goal"));
        }
        for axiom in justification.axioms() {
            if oracle.is_entailed(&justification.axioms().without(axiom))? {
                return Ok(VerificationResult::invalid(format!(
                    "Not minimal: the goal still follows without {:?}",
                    axiom
                )));
            }
        }
        Ok(VerificationResult::valid())
    }

    /// Verify every justification and reject repeated axiom sets.
    pub fn verify_all<S, O>(explanations: &Explanations<O::Entailment, S>, oracle: &mut O) -> Result<VerificationResult>
    where
        S: Statement,
        O: EntailmentOracle<S> + ?Sized,
    {
        let mut seen = HashSet::new();
        for (i, justification) in explanations.iter().enumerate() {
            if !seen.insert(justification.axioms()) {
                return Ok(VerificationResult::invalid(format!("Justification {} is a duplicate", i + 1)));
            }
            let result = Self::verify(justification, oracle)?;
            if !result.is_valid {
                let message = result.message.unwrap_or_default();
                return Ok(VerificationResult::invalid(format!("Justification {}: {}", i + 1, message)));
            }
        }
        Ok(VerificationResult::valid())
    }
}
