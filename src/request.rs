//! Loading/error bookkeeping around gateway calls.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::AppError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestState {
    pub in_flight: usize,
    pub error: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct RequestTracker {
    state: Arc<Mutex<RequestState>>,
}

/// One in-flight slot, released on drop.
struct InFlight<'a> {
    tracker: &'a RequestTracker,
}

impl<'a> InFlight<'a> {
    fn acquire(tracker: &'a RequestTracker) -> Self {
        let mut state = tracker.lock();
        state.in_flight += 1;
        state.error = None;
        Self { tracker }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.tracker.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn execute<F, Fut, T>(&self, call: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let _slot = InFlight::acquire(self);
        let result = call().await;
        if let Err(e) = &result {
            self.lock().error = Some(e.user_message());
        }
        result
    }

    pub fn loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn snapshot(&self) -> RequestState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, RequestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
