use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable flag shared between the caller and a running batch.
///
/// Raising it makes workers skip retrievals that have not started yet and lets
/// in-flight retrievals give up early; the batch ends with [`EngineError::Cancelled`](super::error::EngineError::Cancelled)
/// at the join instead of producing tables.
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
