//! Per-operation cancellation and deadline

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Why an operation was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    DeadlineExceeded,
}

/// Carried by every engine call.
///
/// The engine checks it after its transaction has started and again right
/// before commit. A fired context rolls the transaction back.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl OpContext {
    /// No deadline, never cancelled
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline(Instant::now() + timeout)
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(Interrupted::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Interrupted::DeadlineExceeded);
        }
        Ok(())
    }
}
