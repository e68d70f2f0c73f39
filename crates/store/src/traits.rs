use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CollectionId, DocumentId, IndexType, SummaryId};
use model::{Collection, CollectionSummary, Document, DocumentIndex};

use crate::error::StoreError;

/// Distinguishes "the predicate didn't match any row" from "we didn't even
/// check" — every conditional mutation in this trait returns this instead
/// of a bare `bool`, per `spec.md` §4.1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowsAffected(pub u64);

impl RowsAffected {
    pub fn claimed(&self) -> bool {
        self.0 > 0
    }
}

/// C1. All methods are conditional, predicate-guarded mutations or
/// read-only scans; no method ever blind-writes a row.
#[async_trait]
pub trait StateStore: Send + Sync {
    // ---- Document-index scans (§4.3 step 1) ----

    /// `status = PENDING AND observed_version < version AND version = 1`.
    async fn scan_create_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError>;

    /// `status = PENDING AND observed_version < version AND version > 1`.
    async fn scan_update_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError>;

    /// `status = DELETING`.
    async fn scan_delete_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError>;

    // ---- Document-index claims (§4.3 step 3a) ----

    /// Re-asserts the CREATE predicate and sets `status := CREATING`.
    async fn claim_create(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    /// Re-asserts the UPDATE predicate and sets `status := CREATING`.
    async fn claim_update(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    /// Re-asserts `status = DELETING` and sets `status := DELETION_IN_PROGRESS`.
    async fn claim_delete(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    /// Reverts a CREATE/UPDATE claim back to `PENDING`, guarded by
    /// `(status = CREATING AND version = target_version)`. Called when
    /// dispatch to the scheduler fails after the row was already claimed,
    /// so the row remains claimable on the next tick instead of being
    /// stranded in `CREATING` forever (`spec.md` §4.3 step d, §7 "Dispatch
    /// failure").
    async fn revert_create_or_update_claim(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        target_version: i64,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    /// Reverts a DELETE claim back to `DELETING`, guarded by
    /// `status = DELETION_IN_PROGRESS`. Same rationale as
    /// [`Self::revert_create_or_update_claim`].
    async fn revert_delete_claim(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    // ---- Index task callbacks (§4.4) ----

    /// `(status = CREATING AND version = target_version)` ->
    /// `(status = ACTIVE, observed_version = target_version, index_data, error_message = NULL)`.
    async fn complete_index_creation(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        target_version: i64,
        index_data: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    /// `status IN (CREATING, DELETION_IN_PROGRESS)` -> `(status = FAILED, error_message)`.
    async fn fail_index(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    /// Hard delete where `status = DELETION_IN_PROGRESS`.
    async fn delete_index(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
    ) -> Result<RowsAffected, StoreError>;

    // ---- Documents (C8) ----

    async fn get_document(&self, document_id: &DocumentId) -> Result<Option<Document>, StoreError>;

    async fn get_document_index_rows(
        &self,
        document_id: &DocumentId,
    ) -> Result<Vec<DocumentIndex>, StoreError>;

    /// Only applies while the document is not in `{DELETED, UPLOADED, EXPIRED}`.
    async fn set_document_status(
        &self,
        document_id: &DocumentId,
        status: model::DocumentStatus,
    ) -> Result<RowsAffected, StoreError>;

    // ---- Collection summaries (§4.5/§4.6) ----

    /// `status = PENDING AND observed_version != version`.
    async fn scan_summary_candidates(&self) -> Result<Vec<CollectionSummary>, StoreError>;

    async fn get_summary(&self, summary_id: &SummaryId) -> Result<Option<CollectionSummary>, StoreError>;

    /// `status != GENERATING AND version = version_at_scan` -> `status := GENERATING`.
    async fn claim_summary(
        &self,
        summary_id: &SummaryId,
        version_at_scan: i64,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    /// `status = GENERATING AND version = target_version` -> `(status = COMPLETE,
    /// summary, observed_version = target_version, error_message = NULL)`.
    async fn complete_summary(
        &self,
        summary_id: &SummaryId,
        target_version: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    /// `status = GENERATING AND version = target_version` -> `status := FAILED`.
    async fn fail_summary(
        &self,
        summary_id: &SummaryId,
        target_version: i64,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    async fn get_collection(&self, collection_id: &CollectionId) -> Result<Option<Collection>, StoreError>;

    /// `gmt_updated = expected_gmt_updated AND gmt_deleted IS NULL` ->
    /// `(description, gmt_updated = now)`.
    async fn set_collection_description(
        &self,
        collection_id: &CollectionId,
        description: &str,
        expected_gmt_updated: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError>;

    // ---- Collection GC (§4.7) ----

    async fn scan_active_collections(&self) -> Result<Vec<Collection>, StoreError>;
}
