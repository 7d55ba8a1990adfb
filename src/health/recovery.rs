//! Scheduled recovery of failed endpoints.
//!
//! # Responsibilities
//! - Accept reinstatement requests from `mark_error`
//! - Keep them in one time-ordered queue
//! - Reinstate endpoints when their cooldown elapses
//!
//! A single task serves every pending entry, so failure churn costs one
//! heap entry per failure instead of one timer task each.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::health::state::RecoveryOutcome;
use crate::observability::metrics;
use crate::registry::pool::EndpointRegistry;

/// One pending reinstatement. Ordered by due time, then by arrival.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RecoveryEntry {
    due: Instant,
    seq: u64,
    group: String,
    endpoint: String,
}

/// Sending side, held by the engine.
#[derive(Debug, Clone)]
pub struct RecoveryHandle {
    tx: mpsc::UnboundedSender<RecoveryEntry>,
    seq: Arc<AtomicU64>,
}

impl RecoveryHandle {
    /// Queue a reinstatement of `group/endpoint` at `due`.
    ///
    /// Returns false if the scheduler has already stopped.
    pub fn schedule(&self, group: &str, endpoint: &str, due: Instant) -> bool {
        let entry = RecoveryEntry {
            due,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            group: group.to_string(),
            endpoint: endpoint.to_string(),
        };
        match self.tx.send(entry) {
            Ok(()) => {
                tracing::debug!(group, endpoint, "Recovery scheduled");
                true
            }
            Err(_) => {
                tracing::warn!(group, endpoint, "Recovery scheduler not running, endpoint will not auto-recover");
                false
            }
        }
    }
}

/// Background task reinstating failed endpoints.
pub struct RecoveryScheduler {
    registry: Arc<EndpointRegistry>,
    rx: mpsc::UnboundedReceiver<RecoveryEntry>,
    queue: BinaryHeap<Reverse<RecoveryEntry>>,
}

impl RecoveryScheduler {
    /// Create a scheduler and the handle used to feed it.
    pub fn new(registry: Arc<EndpointRegistry>) -> (RecoveryHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = RecoveryHandle {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        };
        let scheduler = Self {
            registry,
            rx,
            queue: BinaryHeap::new(),
        };
        (handle, scheduler)
    }

    /// Number of reinstatements waiting for their due time.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run on a new task until shutdown.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Recovery scheduler starting");
        let mut accepting = true;

        loop {
            let next_due = self.queue.peek().map(|Reverse(entry)| entry.due);
            if !accepting && next_due.is_none() {
                tracing::info!("Recovery scheduler idle with no senders left, exiting");
                break;
            }

            tokio::select! {
                received = self.rx.recv(), if accepting => {
                    match received {
                        Some(entry) => self.queue.push(Reverse(entry)),
                        None => accepting = false,
                    }
                }
                _ = time::sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                    self.fire_due(Instant::now());
                }
                _ = shutdown.recv() => {
                    tracing::info!(
                        pending = self.queue.len(),
                        "Recovery scheduler received shutdown signal, abandoning pending recoveries"
                    );
                    break;
                }
            }
        }
    }

    /// Reinstate every entry due at or before `now`. Returns how many fired.
    fn fire_due(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        while self.queue.peek().is_some_and(|Reverse(entry)| entry.due <= now) {
            if let Some(Reverse(entry)) = self.queue.pop() {
                self.reinstate(&entry);
                fired += 1;
            }
        }
        fired
    }

    fn reinstate(&self, entry: &RecoveryEntry) -> Option<RecoveryOutcome> {
        let group = self.registry.group(&entry.group)?;
        let mut state = group.lock();
        let index = state.position(&entry.endpoint)?;
        let outcome = state.endpoints[index].recover();
        drop(state);

        match outcome {
            RecoveryOutcome::Reinstated => {
                tracing::info!(group = %entry.group, endpoint = %entry.endpoint, "Endpoint recovered after cooldown");
                metrics::record_endpoint_available(&entry.group, &entry.endpoint, true);
            }
            RecoveryOutcome::SkippedOffline => {
                tracing::info!(group = %entry.group, endpoint = %entry.endpoint, "Endpoint offline, scheduled recovery skipped");
            }
            RecoveryOutcome::KeptRateLimited => {
                tracing::debug!(group = %entry.group, endpoint = %entry.endpoint, "Errors cleared, rate limit still in effect");
            }
        }
        metrics::record_recovery(&entry.group, &entry.endpoint, outcome);
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::state::EndpointStatus;
    use crate::registry::endpoint::EndpointSpec;
    use crate::registry::provider::{Credential, ProviderKind};
    use tokio::time::Duration;

    fn registry() -> Arc<EndpointRegistry> {
        let mut builder = EndpointRegistry::builder();
        for name in ["groq_1", "groq_2"] {
            builder
                .register("groq", EndpointSpec::with_defaults(name, ProviderKind::Groq, Credential::new("k")))
                .unwrap();
        }
        Arc::new(builder.build())
    }

    fn status_of(registry: &EndpointRegistry, name: &str) -> (EndpointStatus, u32) {
        let group = registry.group("groq").unwrap();
        let state = group.lock();
        let ep = &state.endpoints[state.position(name).unwrap()];
        (ep.status(), ep.error_count())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_due_in_order() {
        let registry = registry();
        for name in ["groq_1", "groq_2"] {
            let group = registry.group("groq").unwrap();
            let mut state = group.lock();
            let idx = state.position(name).unwrap();
            state.endpoints[idx].mark_error();
        }

        let (handle, mut scheduler) = RecoveryScheduler::new(registry.clone());
        let now = Instant::now();
        handle.schedule("groq", "groq_2", now + Duration::from_secs(20));
        handle.schedule("groq", "groq_1", now + Duration::from_secs(10));
        while let Ok(entry) = scheduler.rx.try_recv() {
            scheduler.queue.push(Reverse(entry));
        }
        assert_eq!(scheduler.pending(), 2);

        assert_eq!(scheduler.fire_due(now + Duration::from_secs(5)), 0);
        assert_eq!(scheduler.fire_due(now + Duration::from_secs(10)), 1);
        assert_eq!(status_of(&registry, "groq_1"), (EndpointStatus::Active, 0));
        assert_eq!(status_of(&registry, "groq_2"), (EndpointStatus::Error, 1));

        assert_eq!(scheduler.fire_due(now + Duration::from_secs(30)), 1);
        assert_eq!(status_of(&registry, "groq_2"), (EndpointStatus::Active, 0));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reinstates_after_cooldown() {
        let registry = registry();
        {
            let group = registry.group("groq").unwrap();
            group.lock().endpoints[0].mark_error();
        }

        let (handle, scheduler) = RecoveryScheduler::new(registry.clone());
        let (shutdown_tx, _) = broadcast::channel(1);
        let task = scheduler.spawn(shutdown_tx.subscribe());

        handle.schedule("groq", "groq_1", Instant::now() + Duration::from_secs(60));

        time::sleep(Duration::from_secs(59)).await;
        assert_eq!(status_of(&registry, "groq_1").0, EndpointStatus::Error);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(status_of(&registry, "groq_1").0, EndpointStatus::Active);

        let _ = shutdown_tx.send(());
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_survives_recovery() {
        let registry = registry();
        {
            let group = registry.group("groq").unwrap();
            let mut state = group.lock();
            state.endpoints[0].mark_error();
            state.endpoints[0].mark_offline();
        }

        let (handle, scheduler) = RecoveryScheduler::new(registry.clone());
        let (shutdown_tx, _) = broadcast::channel(1);
        let task = scheduler.spawn(shutdown_tx.subscribe());

        handle.schedule("groq", "groq_1", Instant::now() + Duration::from_secs(1));
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(status_of(&registry, "groq_1"), (EndpointStatus::Offline, 1));

        let _ = shutdown_tx.send(());
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_pending() {
        let registry = registry();
        registry.group("groq").unwrap().lock().endpoints[0].mark_error();

        let (handle, scheduler) = RecoveryScheduler::new(registry.clone());
        let (shutdown_tx, _) = broadcast::channel(1);
        let task = scheduler.spawn(shutdown_tx.subscribe());

        handle.schedule("groq", "groq_1", Instant::now() + Duration::from_secs(60));
        tokio::task::yield_now().await;
        let _ = shutdown_tx.send(());
        task.await.unwrap();

        assert!(!handle.schedule("groq", "groq_1", Instant::now()));
        assert_eq!(status_of(&registry, "groq_1").0, EndpointStatus::Error);
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_ignored() {
        let registry = registry();
        let (_handle, scheduler) = RecoveryScheduler::new(registry);
        let entry = RecoveryEntry {
            due: Instant::now(),
            seq: 0,
            group: "groq".into(),
            endpoint: "groq_9".into(),
        };
        assert!(scheduler.reinstate(&entry).is_none());
    }
}
