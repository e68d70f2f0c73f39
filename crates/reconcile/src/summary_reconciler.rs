//! C5: scans `CollectionSummary` rows needing generation and dispatches.
//! Grounded on `CollectionSummaryReconciler` in
//! `aperag/tasks/reconciler.py` (`reconcile_all` /
//! `_get_summaries_needing_reconciliation` / `_reconcile_single_summary` /
//! `_claim_summary_for_processing` / `_schedule_summary_generation`).

use std::sync::Arc;

use common::Runtime;
use scheduler::TaskScheduler;
use store::StateStore;

pub struct SummaryReconciler<RT, S> {
    runtime: RT,
    store: Arc<S>,
    scheduler: Arc<dyn TaskScheduler>,
}

impl<RT, S> SummaryReconciler<RT, S>
where
    RT: Runtime,
    S: StateStore,
{
    pub fn new(runtime: RT, store: Arc<S>, scheduler: Arc<dyn TaskScheduler>) -> Self {
        Self { runtime, store, scheduler }
    }

    pub async fn tick(&self) -> anyhow::Result<TickReport> {
        let _timer = metrics::time_tick("collection_summary");

        let candidates = self.store.scan_summary_candidates().await?;
        tracing::info!(candidates = candidates.len(), "collection summary reconciliation scan complete");

        let mut successful = 0u64;
        let mut failed = 0u64;
        for summary in candidates {
            match self.reconcile_single_summary(summary.id.clone(), summary.collection_id.clone(), summary.version).await {
                Ok(()) => successful += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(summary_id = %summary.id, error = %e, "failed to reconcile collection summary");
                },
            }
        }

        if successful > 0 || failed > 0 {
            metrics::log_tick("collection_summary", successful, failed);
            tracing::info!(successful, failed, "summary reconciliation tick complete");
        }
        Ok(TickReport { successful, failed })
    }

    async fn reconcile_single_summary(
        &self,
        summary_id: common::SummaryId,
        collection_id: common::CollectionId,
        version_at_scan: i64,
    ) -> anyhow::Result<()> {
        let now = self.runtime.now();
        let rows_affected = self.store.claim_summary(&summary_id, version_at_scan, now).await?;
        if !rows_affected.claimed() {
            tracing::debug!(%summary_id, "skipping summary, could not be claimed");
            return Ok(());
        }

        metrics::log_claimed("collection_summary", "generate", 1);
        self.scheduler
            .schedule_summary_generation(summary_id.clone(), collection_id, version_at_scan)
            .await?;
        tracing::info!(%summary_id, version = version_at_scan, "scheduled summary generation task");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    pub successful: u64,
    pub failed: u64,
}
