//! The circuit breaker stopping a collection once a publisher blocks us.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::{error, trace};

/// A one-shot stop signal shared by the workers of a pool.
///
/// Once tripped it stays tripped for the rest of the run. Resuming means
/// starting a new run once the block is lifted.
#[derive(Default)]
pub struct CircuitBreaker {
    tripped: AtomicBool,
    /// Why the breaker has been tripped the first time.
    reason: Mutex<Option<String>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the breaker. Returns true for the first trip only.
    pub fn trip(&self, reason: &str) -> bool {
        trace!("Running CircuitBreaker::trip()");
        let first = !self.tripped.swap(true, Ordering::SeqCst);
        if first {
            error!("Rate limit reached, stopping the collection: {}", reason);
            let mut stored = self.reason.lock().unwrap_or_else(|e| e.into_inner());
            *stored = Some(reason.to_string());
        }
        first
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// The reason given by the first trip.
    pub fn reason(&self) -> Option<String> {
        self.reason
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
