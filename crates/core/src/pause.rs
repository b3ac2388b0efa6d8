//! Cooperative pause signal.
//!
//! Any collaborator (a Ctrl+C handler, a timer, a `/pause` command) can
//! request a pause; the conversation loop checks the flag at content-frame
//! boundaries and between tool calls. Nothing is preempted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable handle to one loop's pause flag.
#[derive(Debug, Clone, Default)]
pub struct PauseSignal {
    requested: Arc<AtomicBool>,
}

impl PauseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to pause at its next checkpoint.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Reset the flag. Returns whether a pause had been requested.
    pub fn clear(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}
