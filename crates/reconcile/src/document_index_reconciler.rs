//! C3: scans `DocumentIndex` rows needing reconciliation, claims them per
//! document, and batch-dispatches to the [`TaskScheduler`]. Grounded on
//! `DocumentIndexReconciler` in `aperag/tasks/reconciler.py`
//! (`reconcile_all` / `_get_indexes_needing_reconciliation` /
//! `_reconcile_single_document` / `_claim_document_indexes` /
//! `_reconcile_document_operations`).

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use common::{DocumentId, IndexType, Runtime};
use scheduler::TaskScheduler;
use store::StateStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Create,
    Update,
    Delete,
}

pub struct DocumentIndexReconciler<RT, S> {
    runtime: RT,
    store: Arc<S>,
    scheduler: Arc<dyn TaskScheduler>,
}

impl<RT, S> DocumentIndexReconciler<RT, S>
where
    RT: Runtime,
    S: StateStore,
{
    pub fn new(runtime: RT, store: Arc<S>, scheduler: Arc<dyn TaskScheduler>) -> Self {
        Self { runtime, store, scheduler }
    }

    /// One tick. Never returns an error for a single document's failure —
    /// those are caught and counted (`spec.md` §4.3, §7); only a scan
    /// (store connectivity) failure propagates, for the host loop's
    /// backoff to handle.
    pub async fn tick(&self) -> anyhow::Result<TickReport> {
        let _timer = metrics::time_tick("document_index");

        let creates = self.store.scan_create_candidates().await?;
        let updates = self.store.scan_update_candidates().await?;
        let deletes = self.store.scan_delete_candidates().await?;

        let mut by_document: BTreeMap<DocumentId, Vec<(IndexType, Action, i64)>> = BTreeMap::new();
        for row in &creates {
            by_document.entry(row.document_id.clone()).or_default().push((row.index_type, Action::Create, row.version));
        }
        for row in &updates {
            by_document.entry(row.document_id.clone()).or_default().push((row.index_type, Action::Update, row.version));
        }
        for row in &deletes {
            by_document.entry(row.document_id.clone()).or_default().push((row.index_type, Action::Delete, row.version));
        }

        tracing::info!(documents = by_document.len(), "document-index reconciliation scan complete");

        let mut successful_docs = 0u64;
        let mut failed_docs = 0u64;
        for (document_id, operations) in by_document {
            match self.reconcile_single_document(&document_id, operations).await {
                Ok(()) => successful_docs += 1,
                Err(e) => {
                    failed_docs += 1;
                    tracing::error!(%document_id, error = %e, "failed to reconcile document");
                },
            }
        }

        metrics::log_tick("document_index", successful_docs, failed_docs);
        tracing::info!(successful_docs, failed_docs, "document-index reconciliation tick complete");
        Ok(TickReport { successful_docs, failed_docs })
    }

    async fn reconcile_single_document(
        &self,
        document_id: &DocumentId,
        operations: Vec<(IndexType, Action, i64)>,
    ) -> anyhow::Result<()> {
        let now = self.runtime.now();
        let mut claimed: Vec<(IndexType, Action, i64)> = Vec::new();

        for (index_type, action, target_version) in operations {
            let rows_affected = match action {
                Action::Create => self.store.claim_create(document_id, index_type, now).await?,
                Action::Update => self.store.claim_update(document_id, index_type, now).await?,
                Action::Delete => self.store.claim_delete(document_id, index_type, now).await?,
            };
            if rows_affected.claimed() {
                claimed.push((index_type, action, target_version));
            } else {
                tracing::debug!(%document_id, ?index_type, ?action, "could not claim index, already being processed");
            }
        }

        if claimed.is_empty() {
            tracing::debug!(%document_id, "skipping document, no indexes claimed this tick");
            return Ok(());
        }

        self.dispatch_claimed(document_id, claimed, now).await
    }

    /// Dispatches each claimed action batch in turn. A claim only commits
    /// the row to `CREATING`/`DELETION_IN_PROGRESS`; if the matching
    /// `schedule_*` call then fails, no task is actually in flight for
    /// those rows, so they are reverted back to `PENDING`/`DELETING` before
    /// the error propagates — otherwise they would never be re-scanned
    /// (`spec.md` §4.3 step d, §7 "Dispatch failure"). A batch that already
    /// dispatched successfully is left alone: a task is in flight for it,
    /// and reverting it too would let a second reconciler claim the same
    /// row while that task is still running.
    async fn dispatch_claimed(
        &self,
        document_id: &DocumentId,
        claimed: Vec<(IndexType, Action, i64)>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut create_versions: BTreeMap<IndexType, i64> = BTreeMap::new();
        let mut update_versions: BTreeMap<IndexType, i64> = BTreeMap::new();
        let mut delete_types: Vec<IndexType> = Vec::new();

        for (index_type, action, target_version) in claimed {
            match action {
                Action::Create => {
                    create_versions.insert(index_type, target_version);
                },
                Action::Update => {
                    update_versions.insert(index_type, target_version);
                },
                Action::Delete => delete_types.push(index_type),
            }
        }

        if !create_versions.is_empty() {
            metrics::log_claimed("document_index", "create", create_versions.len() as u64);
            if let Err(e) = self.scheduler.schedule_create_index(document_id.clone(), create_versions.clone()).await {
                self.revert_create_or_update(document_id, &create_versions, now).await;
                return Err(e.into());
            }
            tracing::info!(%document_id, types = ?create_versions.keys().collect::<Vec<_>>(), "scheduled create task");
        }
        if !update_versions.is_empty() {
            metrics::log_claimed("document_index", "update", update_versions.len() as u64);
            if let Err(e) = self.scheduler.schedule_update_index(document_id.clone(), update_versions.clone()).await {
                self.revert_create_or_update(document_id, &update_versions, now).await;
                return Err(e.into());
            }
            tracing::info!(%document_id, types = ?update_versions.keys().collect::<Vec<_>>(), "scheduled update task");
        }
        if !delete_types.is_empty() {
            metrics::log_claimed("document_index", "delete", delete_types.len() as u64);
            if let Err(e) = self.scheduler.schedule_delete_index(document_id.clone(), delete_types.clone()).await {
                self.revert_delete(document_id, &delete_types, now).await;
                return Err(e.into());
            }
            tracing::info!(%document_id, types = ?delete_types, "scheduled delete task");
        }

        Ok(())
    }

    async fn revert_create_or_update(
        &self,
        document_id: &DocumentId,
        target_versions: &BTreeMap<IndexType, i64>,
        now: DateTime<Utc>,
    ) {
        for (&index_type, &target_version) in target_versions {
            match self.store.revert_create_or_update_claim(document_id, index_type, target_version, now).await {
                Ok(rows) if rows.claimed() => {
                    tracing::warn!(%document_id, ?index_type, "dispatch failed, reverted claim to pending");
                },
                Ok(_) => {
                    tracing::warn!(%document_id, ?index_type, "dispatch failed but claim was already superseded, nothing to revert");
                },
                Err(e) => {
                    tracing::error!(%document_id, ?index_type, error = %e, "dispatch failed and reverting the claim also failed, row stuck in CREATING");
                },
            }
        }
    }

    async fn revert_delete(&self, document_id: &DocumentId, index_types: &[IndexType], now: DateTime<Utc>) {
        for &index_type in index_types {
            match self.store.revert_delete_claim(document_id, index_type, now).await {
                Ok(rows) if rows.claimed() => {
                    tracing::warn!(%document_id, ?index_type, "dispatch failed, reverted claim to deleting");
                },
                Ok(_) => {
                    tracing::warn!(%document_id, ?index_type, "dispatch failed but claim was already superseded, nothing to revert");
                },
                Err(e) => {
                    tracing::error!(%document_id, ?index_type, error = %e, "dispatch failed and reverting the claim also failed, row stuck in DELETION_IN_PROGRESS");
                },
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    pub successful_docs: u64,
    pub failed_docs: u64,
}
