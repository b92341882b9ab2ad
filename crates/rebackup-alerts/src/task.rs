//! Handle to an in-flight alert sound

use std::time::Duration;

use rebackup_core::ports::alerts::AlertLevel;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// A sound alert playing on a blocking thread
///
/// Dropping the handle detaches the playback; it keeps running until the
/// sound ends or the controller's shutdown token is cancelled.
#[derive(Debug)]
pub struct AlertTask {
    level: AlertLevel,
    handle: Option<JoinHandle<bool>>,
    outcome: Option<bool>,
    cancel: CancellationToken,
}

impl AlertTask {
    /// Runs `play` on the blocking pool
    pub(crate) fn spawn<F>(level: AlertLevel, cancel: CancellationToken, play: F) -> Self
    where
        F: FnOnce() -> bool + Send + 'static,
    {
        Self {
            level,
            handle: Some(tokio::task::spawn_blocking(play)),
            outcome: None,
            cancel,
        }
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }

    /// `Some(played)` once the sound has finished, `None` while it is playing
    pub fn outcome(&self) -> Option<bool> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some() || self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits up to `timeout` for playback to end
    ///
    /// Returns `Some(played)` if it ended in time, otherwise `None` with the
    /// sound still playing.
    pub async fn wait_for(&mut self, timeout: Duration) -> Option<bool> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        let handle = self.handle.as_mut()?;
        let joined = tokio::time::timeout(timeout, handle).await.ok()?;
        self.handle = None;
        self.outcome = Some(self.settle(joined));
        self.outcome
    }

    /// Waits for playback to end, however long it takes
    pub async fn wait(mut self) -> bool {
        if let Some(played) = self.outcome {
            return played;
        }
        match self.handle.take() {
            Some(handle) => {
                let joined = handle.await;
                self.settle(joined)
            }
            None => false,
        }
    }

    /// Stops playback at the backend's next poll
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn settle(&self, joined: Result<bool, tokio::task::JoinError>) -> bool {
        joined.unwrap_or_else(|e| {
            warn!(level = %self.level, error = %e, "Alert playback task failed");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_returns_outcome_of_quick_task() {
        let mut task = AlertTask::spawn(AlertLevel::Success, CancellationToken::new(), || true);

        assert_eq!(task.wait_for(Duration::from_secs(5)).await, Some(true));
        assert!(task.is_finished());
        assert_eq!(task.outcome(), Some(true));
        // Later waits reuse the stored outcome.
        assert_eq!(task.wait_for(Duration::ZERO).await, Some(true));
    }

    #[tokio::test]
    async fn test_wait_for_times_out_then_cancel_finishes() {
        let token = CancellationToken::new();
        let inner = token.clone();
        let mut task = AlertTask::spawn(AlertLevel::Error, token, move || {
            while !inner.is_cancelled() {
                std::thread::sleep(Duration::from_millis(10));
            }
            false
        });

        assert_eq!(task.wait_for(Duration::from_millis(50)).await, None);
        assert!(!task.is_finished());

        task.cancel();
        assert!(!task.wait().await);
    }

    #[tokio::test]
    async fn test_panicking_playback_counts_as_failure() {
        let task = AlertTask::spawn(AlertLevel::Warning, CancellationToken::new(), || {
            panic!("decoder exploded")
        });

        assert_eq!(task.level(), AlertLevel::Warning);
        assert!(!task.wait().await);
    }
}
