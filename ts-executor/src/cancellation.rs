use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ExecutionError;

/// The shared stop signal threaded through one query or update's execution.
///
/// A query aborts the same way whether it was cancelled from the outside or
/// ran past its deadline: streams stop producing, whatever was materialized
/// is discarded, and one error is returned - so both conditions live behind
/// the same `check`.
#[derive(Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// A handle external callers can use to cancel this query from another
    /// thread while it is still running.
    pub fn handle(&self) -> CancellationHandle {
        CancellationHandle(Arc::clone(&self.flag))
    }

    pub fn check(&self) -> Result<(), ExecutionError> {
        if self.flag.load(Ordering::Relaxed) {
            return Err(ExecutionError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ExecutionError::Timeout);
            }
        }
        Ok(())
    }
}

pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}
