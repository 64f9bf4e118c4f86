use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "detector is ready" handle.
///
/// The detector loader keeps one clone and flips it once models are loaded;
/// the gate holds another and skips evaluation until it reads `true`.
#[derive(Debug, Clone, Default)]
pub struct DetectorReadiness {
    ready: Arc<AtomicBool>,
}

impl DetectorReadiness {
    /// A handle that starts out not ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that is ready from the start (detector loaded elsewhere, or tests).
    pub fn ready() -> Self {
        let handle = Self::new();
        handle.mark_ready();
        handle
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn mark_unavailable(&self) {
        self.ready.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
