//! Fixed-period driver for the reconciler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::{ReconcileOutcome, Reconciler};
use crate::feed::ArticleFeed;

/// Runs a reconciliation cycle every `period` until shutdown.
pub struct Scheduler<F> {
    reconciler: Arc<Reconciler<F>>,
    period: Duration,
}

impl<F: ArticleFeed> Scheduler<F> {
    pub fn new(reconciler: Arc<Reconciler<F>>, period: Duration) -> Self {
        Self { reconciler, period }
    }

    /// Run cycles in a loop until the shutdown signal flips to `true`.
    ///
    /// The first cycle starts one period after startup. Ticks that fall due while
    /// a cycle is still running are dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.period.is_zero() {
            info!("Article scheduler disabled (poll interval is 0)");
            let _ = shutdown.changed().await;
            return;
        }

        info!("Article scheduler started: every {}s", self.period.as_secs_f64());

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick (fires immediately)
        interval.tick().await;

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Article scheduler received shutdown signal");
                        break;
                    }
                }

                _ = interval.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        info!("Article scheduler stopped");
    }

    async fn run_cycle(&self) {
        debug!("Running scheduled reconciliation");
        match self.reconciler.reconcile_once().await {
            Ok(ReconcileOutcome::Persisted(summary)) => {
                debug!("Scheduled reconciliation stored {} articles", summary.total());
            }
            Ok(outcome) => debug!("Scheduled reconciliation finished: {:?}", outcome),
            // The next tick is the retry.
            Err(e) => error!("Scheduled reconciliation failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio::time::timeout;

    use crate::db::{init_database, Repository};
    use crate::errors::AppError;
    use crate::models::{FeedDetailItem, FeedListItem};

    /// Feed with an empty list that counts how often it was polled.
    #[derive(Default)]
    struct CountingFeed {
        polls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ArticleFeed for CountingFeed {
        async fn fetch_list(&self) -> Result<Vec<FeedListItem>, AppError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn fetch_detail(&self, external_id: &str) -> Result<FeedDetailItem, AppError> {
            Err(AppError::NotFound(format!("no article {}", external_id)))
        }
    }

    async fn scheduler(period: Duration) -> (Scheduler<CountingFeed>, Arc<AtomicUsize>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        let feed = CountingFeed::default();
        let polls = feed.polls.clone();
        let reconciler = Arc::new(Reconciler::new(feed, Arc::new(Repository::new(pool))));
        (Scheduler::new(reconciler, period), polls, temp_dir)
    }

    #[tokio::test]
    async fn test_scheduler_polls_until_shutdown() {
        let (scheduler, polls, _dir) = scheduler(Duration::from_millis(50)).await;
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(400)).await;
        tx.send(true).unwrap();

        timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();

        let count = polls.load(Ordering::SeqCst);
        assert!(count >= 2, "expected at least 2 cycles, got {}", count);

        // No more cycles after shutdown
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(polls.load(Ordering::SeqCst), count);
    }

    #[tokio::test]
    async fn test_disabled_scheduler_never_polls() {
        let (scheduler, polls, _dir) = scheduler(Duration::ZERO).await;
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();

        timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
        assert_eq!(polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scheduler_stops_when_sender_dropped() {
        let (scheduler, _polls, _dir) = scheduler(Duration::from_secs(60)).await;
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(rx));
        drop(tx);

        timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
