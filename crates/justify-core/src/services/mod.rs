pub mod contraction;
pub mod expansion;
pub mod explain;
pub mod hitting_set;
pub mod kb_gen;
pub mod monitor;
pub mod oracle;
pub mod propositional;
pub mod search;
pub mod signature_index;
pub mod truth_table;
pub mod verifier;

mod proptest;

pub use explain::{find_justifications, ExplanationGenerator};
pub use hitting_set::{Explanations, Halt, HittingSetTree};
pub use kb_gen::{GeneratedKb, KbGenerator, KbSpec};
pub use monitor::{CancelAfter, CancellationToken, LoggingMonitor, NullProgressMonitor, ProgressMonitor};
pub use oracle::{CachedOracle, EntailmentOracle, OracleFactory};
pub use propositional::PropositionalOracle;
pub use search::JustificationSearch;
pub use signature_index::SignatureIndex;
pub use verifier::{JustificationVerifier, VerificationResult};
