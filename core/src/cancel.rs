//! Cancellation tokens with an optional auto-cancel deadline.
//!
//! # Design
//! `CancelToken` owns the sending half of a `watch` channel; each request
//! receives a cloneable `CancelSignal`. The channel carries the token state,
//! including the deadline, so a signal keeps timing out after its token is
//! dropped and no timer task is spawned. `release` clears the deadline and
//! `cancel` fires the signal for every subscriber.

use std::future::{self, Future};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CancelState {
    /// Not fired yet; fires on its own once the deadline, if any, passes.
    Armed(Option<Instant>),
    Cancelled,
}

impl CancelState {
    fn has_fired(self) -> bool {
        match self {
            CancelState::Cancelled => true,
            CancelState::Armed(Some(deadline)) => Instant::now() >= deadline,
            CancelState::Armed(None) => false,
        }
    }
}

/// Owner side of a cancellation signal.
#[derive(Debug)]
pub struct CancelToken {
    sender: watch::Sender<CancelState>,
}

impl CancelToken {
    /// Token without a deadline. Only an explicit `cancel` fires it.
    pub fn new() -> Self {
        Self::armed(None)
    }

    /// Token that cancels itself once `timeout` elapses, unless cancelled
    /// or released first. A zero timeout means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        if timeout.is_zero() {
            return Self::new();
        }
        Self::armed(Instant::now().checked_add(timeout))
    }

    fn armed(deadline: Option<Instant>) -> Self {
        let (sender, _) = watch::channel(CancelState::Armed(deadline));
        Self { sender }
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Fire the signal. Calling it again has no further effect.
    pub fn cancel(&self) {
        self.sender.send_replace(CancelState::Cancelled);
    }

    /// Clear the pending deadline without firing the signal. Call once the
    /// guarded operation has completed. A deadline that already passed
    /// stays fired.
    pub fn release(&self) {
        self.sender.send_if_modified(|state| match *state {
            CancelState::Armed(Some(_)) if state.has_fired() => {
                *state = CancelState::Cancelled;
                true
            }
            CancelState::Armed(Some(_)) => {
                *state = CancelState::Armed(None);
                true
            }
            _ => false,
        });
    }

    pub fn is_cancelled(&self) -> bool {
        self.sender.borrow().has_fired()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a `CancelToken`, passed along with a request.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<CancelState>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        self.receiver.borrow().has_fired()
    }

    /// Resolves once the signal fires. Never resolves if the owning token
    /// is dropped without cancelling and no deadline is pending.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            let state = *receiver.borrow_and_update();
            match state {
                CancelState::Cancelled => return,
                CancelState::Armed(Some(deadline)) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(deadline) => {
                            debug!("cancel deadline reached");
                            return;
                        }
                        changed = receiver.changed() => {
                            if changed.is_err() {
                                // Token dropped: the state is frozen, the deadline still applies.
                                tokio::time::sleep_until(deadline).await;
                                debug!("cancel deadline reached");
                                return;
                            }
                        }
                    }
                }
                CancelState::Armed(None) => {
                    if receiver.changed().await.is_err() {
                        future::pending::<()>().await;
                    }
                }
            }
        }
    }

    /// Drive `operation` until it finishes or the signal fires, whichever
    /// comes first. A fired signal drops the operation and yields
    /// `ApiError::Cancelled`.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if self.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => {
                debug!("operation cancelled");
                Err(ApiError::Cancelled)
            }
            result = operation => result,
        }
    }
}
