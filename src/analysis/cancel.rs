//! Cooperative cancellation of long-running solves

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{FemError, FemResult};

/// Shared flag that aborts a solve at its next check point.
///
/// Clones share the same flag, so a host can keep one handle and pass
/// another into the solve.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(FemError::Cancelled)` once cancellation was requested
    pub fn check(&self) -> FemResult<()> {
        if self.is_cancelled() {
            Err(FemError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(token.check().is_ok());
        handle.cancel();
        assert!(matches!(token.check(), Err(FemError::Cancelled)));
    }
}
