//! Cooperative cancellation for resolution sequences.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use crate::clock::Clock;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Cancellation flag observed at every suspension point of a sequence.
#[derive(Clone, Debug)]
pub struct CancelToken {
    id: u64,
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            id: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            tx: Arc::new(tx),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleeps on `clock` unless cancelled first.
    ///
    /// Returns `false` when the wait was cut short by cancellation.
    pub async fn pause(&self, clock: &dyn Clock, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancelled() => false,
            _ = clock.sleep(duration) => true,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;

    #[tokio::test(start_paused = true)]
    async fn pause_completes_without_cancellation() {
        let token = CancelToken::new();
        assert!(token.pause(&TokioClock, Duration::from_millis(350)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_pause() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let task =
            tokio::spawn(async move { waiter.pause(&TokioClock, Duration::from_secs(60)).await });
        tokio::task::yield_now().await;
        token.cancel();
        assert!(!task.await.unwrap());
        assert!(token.is_cancelled());
    }

    #[test]
    fn tokens_have_distinct_ids() {
        assert_ne!(CancelToken::new().id(), CancelToken::new().id());
    }
}
