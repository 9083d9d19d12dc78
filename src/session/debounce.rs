//! Restart-on-input single-shot timer.

use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Holds the latest value until a quiet window passes without new input.
///
/// Pushing a value replaces any pending one and restarts the window, so
/// only the last value of a burst is ever released.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Creates an idle debouncer with the given quiet window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replaces the pending value and restarts the window.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.window));
    }

    /// Returns `true` while a value is waiting for its window to pass.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Waits for the pending value's window to pass and releases it.
    ///
    /// Never resolves while idle. Cancel-safe: dropping the future keeps
    /// the pending value and its deadline.
    pub async fn ready(&mut self) -> T {
        loop {
            let Some((_, deadline)) = &self.pending else {
                return std::future::pending().await;
            };
            sleep_until(*deadline).await;
            if let Some((value, deadline)) = self.pending.take() {
                if deadline <= Instant::now() {
                    return value;
                }
                self.pending = Some((value, deadline));
            }
        }
    }
}
