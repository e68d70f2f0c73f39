//! C7: sweeps active collections and enqueues an idempotent cleanup task
//! per collection. Grounded on `CollectionGCReconciler.reconcile_all` in
//! `aperag/tasks/reconciler.py`. No claiming: the cleanup task itself is
//! idempotent, so there's nothing to race over.

use std::sync::Arc;

use scheduler::TaskScheduler;
use store::StateStore;

pub struct CollectionGcReconciler<S> {
    store: Arc<S>,
    scheduler: Arc<dyn TaskScheduler>,
}

impl<S> CollectionGcReconciler<S>
where
    S: StateStore,
{
    pub fn new(store: Arc<S>, scheduler: Arc<dyn TaskScheduler>) -> Self {
        Self { store, scheduler }
    }

    pub async fn tick(&self) -> anyhow::Result<u64> {
        let collections = self.store.scan_active_collections().await?;
        if collections.is_empty() {
            return Ok(0);
        }

        let mut dispatched = 0u64;
        for collection in collections {
            if let Err(e) = self.scheduler.schedule_collection_cleanup(collection.id.clone()).await {
                tracing::error!(collection_id = %collection.id, error = %e, "failed to schedule collection cleanup");
                continue;
            }
            dispatched += 1;
        }

        tracing::info!(dispatched, "collection GC sweep complete");
        Ok(dispatched)
    }
}
