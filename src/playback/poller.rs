use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Fixed-interval timer task tied to a cancellation token.
///
/// The player has no fine-grained position events, so state is sampled
/// instead. The task ends when the token (or its parent) is cancelled or the
/// `Poller` is dropped.
#[derive(Debug)]
pub struct Poller {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Poller {
    pub fn spawn<F>(interval: Duration, parent: &CancellationToken, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let token = parent.child_token();
        let loop_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => tick(),
                }
            }
            trace!("poller stopped");
        });

        Self { token, task }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn stopped(&mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
