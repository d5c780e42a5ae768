pub mod config;
pub mod formula;
pub mod justification;
pub mod statement;
pub mod statistics;

pub use config::*;
pub use formula::*;
pub use justification::*;
pub use statement::*;
pub use statistics::*;
