//! Mock transfer client for testing.

use super::traits::*;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock transfer client.
///
/// Records every request it accepts. Failures can be queued up front and are
/// consumed one per call; an optional delay widens race windows in tests.
#[derive(Clone, Default)]
pub struct MockTransferClient {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    calls: usize,
    completed: Vec<TransferRequest>,
    queued_failures: VecDeque<TransferError>,
    delay: Option<Duration>,
}

impl MockTransferClient {
    /// Create new mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call with `error`.
    pub fn fail_next(&self, error: TransferError) {
        self.state.lock().unwrap().queued_failures.push_back(error);
    }

    /// Sleep for `delay` inside every call before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Number of times `transfer` was invoked, including failures.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    /// Transfers that were accepted.
    pub fn completed(&self) -> Vec<TransferRequest> {
        self.state.lock().unwrap().completed.clone()
    }
}

#[async_trait]
impl TransferClient for MockTransferClient {
    async fn transfer(&self, request: &TransferRequest) -> TransferResult<()> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls += 1;
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.queued_failures.pop_front() {
            return Err(error);
        }
        if let Some(done) = state
            .completed
            .iter()
            .find(|done| done.reference == request.reference)
        {
            if done == request {
                return Ok(());
            }
            return Err(TransferError::Duplicate(request.reference));
        }
        state.completed.push(request.clone());
        Ok(())
    }
}
