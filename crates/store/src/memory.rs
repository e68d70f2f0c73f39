//! An in-memory [`StateStore`] used by `reconcile`'s scenario tests (and
//! available to any other crate's tests behind the `testing` feature). It
//! implements every predicate exactly as specified rather than a loosened
//! approximation, so a test that passes here is evidence the predicate
//! logic is right, not just that some store accepted the call.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CollectionId, DocumentId, IndexType, SummaryId};
use model::{Collection, CollectionSummary, Document, DocumentIndex, DocumentIndexStatus, DocumentStatus};

use crate::{error::StoreError, traits::RowsAffected, StateStore};

type IndexKey = (DocumentId, IndexType);

#[derive(Default)]
struct Tables {
    document_indexes: HashMap<IndexKey, DocumentIndex>,
    documents: HashMap<DocumentId, Document>,
    summaries: HashMap<SummaryId, CollectionSummary>,
    collections: HashMap<CollectionId, Collection>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_document_index(&self, row: DocumentIndex) {
        let mut t = self.inner.lock().unwrap();
        t.document_indexes.insert((row.document_id.clone(), row.index_type), row);
    }

    pub fn insert_document(&self, doc: Document) {
        self.inner.lock().unwrap().documents.insert(doc.id.clone(), doc);
    }

    pub fn insert_summary(&self, row: CollectionSummary) {
        self.inner.lock().unwrap().summaries.insert(row.id.clone(), row);
    }

    pub fn insert_collection(&self, row: Collection) {
        self.inner.lock().unwrap().collections.insert(row.id.clone(), row);
    }

    pub fn get_document_index(&self, document_id: &DocumentId, index_type: IndexType) -> Option<DocumentIndex> {
        self.inner
            .lock()
            .unwrap()
            .document_indexes
            .get(&(document_id.clone(), index_type))
            .cloned()
    }

    pub fn row_exists(&self, document_id: &DocumentId, index_type: IndexType) -> bool {
        self.inner
            .lock()
            .unwrap()
            .document_indexes
            .contains_key(&(document_id.clone(), index_type))
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn scan_create_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError> {
        let t = self.inner.lock().unwrap();
        Ok(t.document_indexes
            .values()
            .filter(|r| r.status == DocumentIndexStatus::Pending && r.observed_version < r.version && r.version == 1)
            .cloned()
            .collect())
    }

    async fn scan_update_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError> {
        let t = self.inner.lock().unwrap();
        Ok(t.document_indexes
            .values()
            .filter(|r| r.status == DocumentIndexStatus::Pending && r.observed_version < r.version && r.version > 1)
            .cloned()
            .collect())
    }

    async fn scan_delete_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError> {
        let t = self.inner.lock().unwrap();
        Ok(t.document_indexes
            .values()
            .filter(|r| r.status == DocumentIndexStatus::Deleting)
            .cloned()
            .collect())
    }

    async fn claim_create(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.document_indexes.get_mut(&(document_id.clone(), index_type)) else {
            return Ok(RowsAffected(0));
        };
        if row.status == DocumentIndexStatus::Pending && row.observed_version < row.version && row.version == 1 {
            row.status = DocumentIndexStatus::Creating;
            row.gmt_updated = now;
            row.gmt_last_reconciled = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn claim_update(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.document_indexes.get_mut(&(document_id.clone(), index_type)) else {
            return Ok(RowsAffected(0));
        };
        if row.status == DocumentIndexStatus::Pending && row.observed_version < row.version && row.version > 1 {
            row.status = DocumentIndexStatus::Creating;
            row.gmt_updated = now;
            row.gmt_last_reconciled = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn claim_delete(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.document_indexes.get_mut(&(document_id.clone(), index_type)) else {
            return Ok(RowsAffected(0));
        };
        if row.status == DocumentIndexStatus::Deleting {
            row.status = DocumentIndexStatus::DeletionInProgress;
            row.gmt_updated = now;
            row.gmt_last_reconciled = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn revert_create_or_update_claim(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        target_version: i64,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.document_indexes.get_mut(&(document_id.clone(), index_type)) else {
            return Ok(RowsAffected(0));
        };
        if row.status == DocumentIndexStatus::Creating && row.version == target_version {
            row.status = DocumentIndexStatus::Pending;
            row.gmt_updated = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn revert_delete_claim(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.document_indexes.get_mut(&(document_id.clone(), index_type)) else {
            return Ok(RowsAffected(0));
        };
        if row.status == DocumentIndexStatus::DeletionInProgress {
            row.status = DocumentIndexStatus::Deleting;
            row.gmt_updated = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn complete_index_creation(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        target_version: i64,
        index_data: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.document_indexes.get_mut(&(document_id.clone(), index_type)) else {
            return Ok(RowsAffected(0));
        };
        if row.status == DocumentIndexStatus::Creating && row.version == target_version {
            row.status = DocumentIndexStatus::Active;
            row.observed_version = target_version;
            row.index_data = index_data;
            row.error_message = None;
            row.gmt_updated = now;
            row.gmt_last_reconciled = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn fail_index(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.document_indexes.get_mut(&(document_id.clone(), index_type)) else {
            return Ok(RowsAffected(0));
        };
        if matches!(
            row.status,
            DocumentIndexStatus::Creating | DocumentIndexStatus::DeletionInProgress
        ) {
            row.status = DocumentIndexStatus::Failed;
            row.error_message = Some(error_message.to_string());
            row.gmt_updated = now;
            row.gmt_last_reconciled = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn delete_index(&self, document_id: &DocumentId, index_type: IndexType) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let key = (document_id.clone(), index_type);
        match t.document_indexes.get(&key) {
            Some(row) if row.status == DocumentIndexStatus::DeletionInProgress => {
                t.document_indexes.remove(&key);
                Ok(RowsAffected(1))
            },
            _ => Ok(RowsAffected(0)),
        }
    }

    async fn get_document(&self, document_id: &DocumentId) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.lock().unwrap().documents.get(document_id).cloned())
    }

    async fn get_document_index_rows(&self, document_id: &DocumentId) -> Result<Vec<DocumentIndex>, StoreError> {
        let t = self.inner.lock().unwrap();
        Ok(t.document_indexes
            .values()
            .filter(|r| &r.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn set_document_status(
        &self,
        document_id: &DocumentId,
        status: DocumentStatus,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(doc) = t.documents.get_mut(document_id) else {
            return Ok(RowsAffected(0));
        };
        if doc.status.is_aggregator_exempt() {
            return Ok(RowsAffected(0));
        }
        doc.status = status;
        Ok(RowsAffected(1))
    }

    async fn scan_summary_candidates(&self) -> Result<Vec<CollectionSummary>, StoreError> {
        let t = self.inner.lock().unwrap();
        Ok(t.summaries
            .values()
            .filter(|s| s.status == model::CollectionSummaryStatus::Pending && s.observed_version != s.version)
            .cloned()
            .collect())
    }

    async fn get_summary(&self, summary_id: &SummaryId) -> Result<Option<CollectionSummary>, StoreError> {
        Ok(self.inner.lock().unwrap().summaries.get(summary_id).cloned())
    }

    async fn claim_summary(
        &self,
        summary_id: &SummaryId,
        version_at_scan: i64,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.summaries.get_mut(summary_id) else {
            return Ok(RowsAffected(0));
        };
        if row.status != model::CollectionSummaryStatus::Generating && row.version == version_at_scan {
            row.status = model::CollectionSummaryStatus::Generating;
            row.gmt_updated = now;
            row.gmt_last_reconciled = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn complete_summary(
        &self,
        summary_id: &SummaryId,
        target_version: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.summaries.get_mut(summary_id) else {
            return Ok(RowsAffected(0));
        };
        if row.status == model::CollectionSummaryStatus::Generating && row.version == target_version {
            row.status = model::CollectionSummaryStatus::Complete;
            row.summary = Some(content.to_string());
            row.observed_version = target_version;
            row.error_message = None;
            row.gmt_updated = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn fail_summary(
        &self,
        summary_id: &SummaryId,
        target_version: i64,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.summaries.get_mut(summary_id) else {
            return Ok(RowsAffected(0));
        };
        if row.status == model::CollectionSummaryStatus::Generating && row.version == target_version {
            row.status = model::CollectionSummaryStatus::Failed;
            row.error_message = Some(error_message.to_string());
            row.gmt_updated = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn get_collection(&self, collection_id: &CollectionId) -> Result<Option<Collection>, StoreError> {
        Ok(self.inner.lock().unwrap().collections.get(collection_id).cloned())
    }

    async fn set_collection_description(
        &self,
        collection_id: &CollectionId,
        description: &str,
        expected_gmt_updated: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let mut t = self.inner.lock().unwrap();
        let Some(row) = t.collections.get_mut(collection_id) else {
            return Ok(RowsAffected(0));
        };
        if row.gmt_updated == expected_gmt_updated && !row.is_deleted() {
            row.description = Some(description.to_string());
            row.gmt_updated = now;
            Ok(RowsAffected(1))
        } else {
            Ok(RowsAffected(0))
        }
    }

    async fn scan_active_collections(&self) -> Result<Vec<Collection>, StoreError> {
        let t = self.inner.lock().unwrap();
        Ok(t.collections
            .values()
            .filter(|c| c.status == model::CollectionStatus::Active)
            .cloned()
            .collect())
    }
}
