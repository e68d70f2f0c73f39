//! Binary entry point: parses config, connects to Postgres, and spawns
//! the three reconciler tick loops plus the demo in-process task worker.
//! Grounded on `backend_harness`'s `clap::Parser` + `tokio::main` shape and
//! `application/src/scheduled_jobs/mod.rs`'s pattern of spawning one task
//! per reconciler.

mod config;
mod tracing_init;

use std::sync::Arc;

use clap::Parser;
use common::TokioRuntime;
use reconcile::{host_loop, CollectionGcReconciler, DocumentIndexReconciler, IndexCallbacks, SummaryCallbacks, SummaryReconciler};
use scheduler::channel::{run_always_succeeds_worker, ChannelScheduler};
use store::postgres::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_init::init();
    let args = config::Args::parse();

    let pool = args.deadpool_config().create_pool(
        Some(deadpool_postgres::Runtime::Tokio1),
        tokio_postgres::NoTls,
    )?;
    let store = Arc::new(PostgresStore::new(pool));

    let runtime = TokioRuntime;
    let (index_scheduler, task_rx) = ChannelScheduler::new();
    let index_scheduler: Arc<dyn scheduler::TaskScheduler> = Arc::new(index_scheduler);

    let index_callbacks = Arc::new(IndexCallbacks::new(runtime, store.clone(), args.enabled_index_types()));
    let summary_callbacks = Arc::new(SummaryCallbacks::new(runtime, store.clone()));

    tokio::spawn(run_always_succeeds_worker(task_rx, index_callbacks.clone(), summary_callbacks.clone()));

    let document_index_reconciler = Arc::new(DocumentIndexReconciler::new(runtime, store.clone(), index_scheduler.clone()));
    let summary_reconciler = Arc::new(SummaryReconciler::new(runtime, store.clone(), index_scheduler.clone()));
    let collection_gc_reconciler = Arc::new(CollectionGcReconciler::new(store.clone(), index_scheduler.clone()));

    let document_index_tick = args.document_index_tick();
    let summary_tick = args.summary_tick();
    let collection_gc_tick = args.collection_gc_tick();

    let document_index_task = {
        let reconciler = document_index_reconciler.clone();
        tokio::spawn(async move {
            host_loop::run_forever("document_index", document_index_tick, || {
                let reconciler = reconciler.clone();
                async move { reconciler.tick().await.map(|_| ()) }
            })
            .await;
        })
    };

    let summary_task = {
        let reconciler = summary_reconciler.clone();
        tokio::spawn(async move {
            host_loop::run_forever("collection_summary", summary_tick, || {
                let reconciler = reconciler.clone();
                async move { reconciler.tick().await.map(|_| ()) }
            })
            .await;
        })
    };

    let collection_gc_task = {
        let reconciler = collection_gc_reconciler.clone();
        tokio::spawn(async move {
            host_loop::run_forever("collection_gc", collection_gc_tick, || {
                let reconciler = reconciler.clone();
                async move { reconciler.tick().await.map(|_| ()) }
            })
            .await;
        })
    };

    tracing::info!("document-index-controller started");
    tokio::select! {
        _ = document_index_task => {},
        _ = summary_task => {},
        _ = collection_gc_task => {},
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        },
    }

    Ok(())
}
