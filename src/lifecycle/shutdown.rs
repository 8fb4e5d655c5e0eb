//! Shutdown coordination for the gateway.
//!
//! A shutdown is a broadcast followed by a bounded drain: the server stops
//! accepting and lets in-flight responses finish, but a streaming response
//! cannot hold the process (and with it the feed) forever.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// How a drain ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Drain<T> {
    /// The task finished on its own.
    Completed(T),
    /// The deadline passed; the task was aborted.
    DeadlineExceeded,
    /// A forced stop arrived first; the task was aborted.
    Forced,
    /// The task panicked or was cancelled elsewhere.
    Failed,
}

/// Coordinator for graceful shutdown.
///
/// The server and any other long-running tasks subscribe to the broadcast;
/// [`Shutdown::drain`] fires it and bounds the wait.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the broadcast without waiting for anyone.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still subscribed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Fire the broadcast, then wait for `task` at most `deadline`, or until
    /// `force` resolves (e.g. a second Ctrl+C). A task still running after
    /// that is aborted.
    pub async fn drain<T, F>(&self, mut task: JoinHandle<T>, deadline: Duration, force: F) -> Drain<T>
    where
        F: Future<Output = ()>,
    {
        self.trigger();
        tracing::info!(
            subscribers = self.receiver_count(),
            deadline_secs = deadline.as_secs_f64(),
            "Draining"
        );

        let outcome = tokio::select! {
            joined = &mut task => match joined {
                Ok(value) => return Drain::Completed(value),
                Err(e) => {
                    tracing::error!(error = %e, "Drained task failed");
                    return Drain::Failed;
                }
            },
            _ = tokio::time::sleep(deadline) => Drain::DeadlineExceeded,
            _ = force => Drain::Forced,
        };

        let reason = match outcome {
            Drain::Forced => "forced",
            _ => "deadline",
        };
        tracing::warn!(reason, "In-flight work did not finish, aborting");
        task.abort();
        outcome
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
