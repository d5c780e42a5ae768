//! Minimal justifications for entailments.
//!
//! A justification is a minimal subset of a knowledge base that is enough
//! for a consequence to follow. The search treats the decision procedure as
//! a black box behind [`services::EntailmentOracle`]: it grows a candidate
//! set until the oracle reports entailment, shrinks it to a minimal one, and
//! enumerates alternatives with a hitting-set tree.
//!
//! [`services::PropositionalOracle`] decides classical propositional
//! entailment over [`models::Formula`] premises.

pub mod error;
pub mod models;
pub mod services;

pub use error::{Error, Result};
