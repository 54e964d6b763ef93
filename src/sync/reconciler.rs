//! One reconciliation cycle: list → diff → detail fetch → bulk upsert.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::db::Repository;
use crate::errors::AppError;
use crate::feed::ArticleFeed;
use crate::models::{FeedListItem, NewArticle, UpsertSummary};

/// Result of a reconciliation cycle that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Another cycle was still running, nothing was done
    Skipped,
    /// Every listed article is already stored
    UpToDate,
    /// Missing articles were fetched and written
    Persisted(UpsertSummary),
}

/// Brings the store in line with the upstream article list.
///
/// Articles already stored are never fetched again, even when their content
/// changed upstream. Cycles are serialized: a call made while another cycle is
/// running returns [`ReconcileOutcome::Skipped`].
pub struct Reconciler<F> {
    feed: F,
    repo: Arc<Repository>,
    running: Mutex<()>,
}

impl<F: ArticleFeed> Reconciler<F> {
    pub fn new(feed: F, repo: Arc<Repository>) -> Self {
        Self {
            feed,
            repo,
            running: Mutex::new(()),
        }
    }

    /// Run one cycle. Any error aborts the cycle without writing anything.
    pub async fn reconcile_once(&self) -> Result<ReconcileOutcome, AppError> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Previous reconciliation cycle still running, skipping this one");
            return Ok(ReconcileOutcome::Skipped);
        };

        info!("Scanning for new articles");
        let listed = self.feed.fetch_list().await?;

        let listed_ids: HashSet<String> = listed.iter().map(|i| i.external_id.clone()).collect();
        let existing = self.repo.find_existing(&listed_ids).await?;
        let missing = missing_ids(&listed, &existing);

        debug!(
            "Feed lists {} articles, {} already stored, {} missing",
            listed_ids.len(),
            existing.len(),
            missing.len()
        );

        if missing.is_empty() {
            info!("There are no new articles to be added");
            return Ok(ReconcileOutcome::UpToDate);
        }

        // All-or-nothing: one failed detail fetch discards the whole batch.
        let mut articles = Vec::with_capacity(missing.len());
        for external_id in &missing {
            let detail = self.feed.fetch_detail(external_id).await.map_err(|e| {
                warn!(
                    "Detail fetch for article {} failed, discarding {} fetched articles: {}",
                    external_id,
                    articles.len(),
                    e
                );
                e
            })?;

            if detail.external_id != *external_id {
                warn!(
                    "Detail fetch for article {} returned article {}, discarding the batch",
                    external_id, detail.external_id
                );
                return Err(AppError::Parse(format!(
                    "detail for article {} returned article {}",
                    external_id, detail.external_id
                )));
            }
            articles.push(NewArticle::from(detail));
        }

        let summary = self.repo.upsert_batch(&articles).await?;
        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Added {} new articles",
            summary.total()
        );

        Ok(ReconcileOutcome::Persisted(summary))
    }
}

/// External ids from `listed` that are not in `existing`, in feed order, without duplicates.
pub fn missing_ids(listed: &[FeedListItem], existing: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut missing = Vec::new();
    for item in listed {
        let id = item.external_id.as_str();
        if !existing.contains(id) && seen.insert(id) {
            missing.push(id.to_string());
        }
    }
    missing
}
