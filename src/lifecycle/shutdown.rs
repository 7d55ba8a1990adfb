//! Shutdown coordination for the engine's background tasks.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let subscribers = self.tx.send(()).unwrap_or(0);
        tracing::info!(subscribers, "Shutdown triggered");
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Trigger shutdown and wait for `tasks`, giving up after `deadline`.
    ///
    /// Returns false if the deadline passed first.
    pub async fn drain(&self, tasks: Vec<JoinHandle<()>>, deadline: Duration) -> bool {
        self.trigger();
        let wait_all = async {
            for task in tasks {
                if let Err(e) = task.await {
                    tracing::error!(error = %e, "Background task ended abnormally");
                }
            }
        };
        match tokio::time::timeout(deadline, wait_all).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(deadline_secs = deadline.as_secs(), "Shutdown deadline passed, exiting anyway");
                false
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
