use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::models::{Justification, Statement};

/// Notification and cancellation sink threaded through a search.
///
/// `found_justification` is called exactly once per new, distinct
/// justification, in discovery order. `is_cancelled` is polled before every
/// oracle-heavy phase; once it returns true the search unwinds and keeps what
/// it has collected.
pub trait ProgressMonitor<E, S: Ord> {
    fn found_justification(&mut self, _justification: &Justification<E, S>, _found_so_far: &[Justification<E, S>]) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<E, S: Ord, M: ProgressMonitor<E, S> + ?Sized> ProgressMonitor<E, S> for &mut M {
    fn found_justification(&mut self, justification: &Justification<E, S>, found_so_far: &[Justification<E, S>]) {
        (**self).found_justification(justification, found_so_far)
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Ignores notifications and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressMonitor;

impl<E, S: Ord> ProgressMonitor<E, S> for NullProgressMonitor {}

/// Cancels the search once `n` justifications have been reported.
#[derive(Debug, Clone, Copy)]
pub struct CancelAfter {
    limit: usize,
    found: usize,
}

impl CancelAfter {
    pub fn new(limit: usize) -> Self {
        Self { limit, found: 0 }
    }

    pub fn found(&self) -> usize {
        self.found
    }
}

impl<E, S: Ord> ProgressMonitor<E, S> for CancelAfter {
    fn found_justification(&mut self, _justification: &Justification<E, S>, _found_so_far: &[Justification<E, S>]) {
        self.found += 1;
    }

    fn is_cancelled(&self) -> bool {
        self.found >= self.limit
    }
}

/// Shared cancellation flag; clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl<E, S: Ord> ProgressMonitor<E, S> for CancellationToken {
    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }
}

/// Emits a `tracing` event per justification and defers cancellation to a token.
#[derive(Debug, Clone, Default)]
pub struct LoggingMonitor {
    token: CancellationToken,
}

impl LoggingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl<E: Debug, S: Statement> ProgressMonitor<E, S> for LoggingMonitor {
    fn found_justification(&mut self, justification: &Justification<E, S>, found_so_far: &[Justification<E, S>]) {
        info!(
            entailment = ?justification.entailment(),
            size = justification.axioms().len(),
            total = found_so_far.len(),
            "found justification"
        );
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
