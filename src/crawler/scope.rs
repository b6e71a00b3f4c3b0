//! Per-task cancellation scope with a deadline

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancellation scope owned by exactly one crawl task
///
/// The token is a child of the crawl's token, so cancelling the crawl
/// cancels the task too. It also fires when `timeout` elapses. Dropping the
/// scope cancels the token and stops the timer.
pub struct TaskScope {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl TaskScope {
    pub fn new(parent: &CancellationToken, timeout: Duration) -> Self {
        let token = parent.child_token();
        let deadline = token.clone();

        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => deadline.cancel(),
                _ = deadline.cancelled() => {}
            }
        });

        Self { token, timer }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.token.cancel();
        self.timer.abort();
    }
}
