//! The reconciliation core. Each reconciler/callback pair is generic over
//! `Runtime` and `StateStore` so tests run them against
//! `store::memory::InMemoryStore` and the `controller` binary wires them
//! against `store::postgres::PostgresStore`.

pub mod aggregator;
pub mod collection_gc;
pub mod document_index_reconciler;
pub mod host_loop;
pub mod index_callbacks;
pub mod summary_callbacks;
pub mod summary_reconciler;

pub use aggregator::aggregate;
pub use collection_gc::CollectionGcReconciler;
pub use document_index_reconciler::DocumentIndexReconciler;
pub use index_callbacks::IndexCallbacks;
pub use summary_callbacks::SummaryCallbacks;
pub use summary_reconciler::SummaryReconciler;
