//! View scope
//!
//! Requests are never cancelled. A component that goes away closes its scope,
//! and any response that arrives afterwards is dropped instead of written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Liveness flag of the component instance that owns some state
#[derive(Debug, Clone)]
pub struct ViewScope {
    active: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the owner as gone; late results will be discarded
    pub fn close(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}
