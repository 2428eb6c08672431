use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Shared flag that aborts an in-flight template read at the next line.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Timeout and cancellation settings applied to every template read.
#[derive(Debug, Clone, Default)]
pub struct ReadLimits {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl ReadLimits {
    /// Start the clock for one logical read.
    pub fn arm(&self) -> ReadGuard {
        ReadGuard {
            deadline: self.timeout.map(|t| Instant::now() + t),
            cancel: self.cancel.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadGuard {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl ReadGuard {
    pub fn check(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::TimedOut);
        }
        Ok(())
    }
}
