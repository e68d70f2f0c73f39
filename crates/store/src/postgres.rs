//! Production [`StateStore`]: Postgres via `tokio-postgres`, pooled with
//! `deadpool-postgres` — a thin pool wrapper, SQL text close to the metal,
//! no ORM.
//!
//! Schema (see `crates/store/schema.sql`): `document_indexes`,
//! `documents`, `collection_summaries`, `collections`. Every write method
//! here is a single `UPDATE ... WHERE <predicate> RETURNING 1` (or
//! `DELETE`), so rows-affected comes straight from the driver and no
//! read-then-write race is possible.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CollectionId, DocumentId, IndexType, SummaryId};
use deadpool_postgres::Pool;
use model::{
    Collection, CollectionStatus, CollectionSummary, CollectionSummaryStatus, Document, DocumentIndex,
    DocumentIndexStatus, DocumentStatus,
};
use tokio_postgres::Row;

use crate::{error::StoreError, traits::RowsAffected, StateStore};

#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn status_to_sql(status: DocumentIndexStatus) -> &'static str {
    status.as_str()
}

fn status_from_sql(s: &str) -> Result<DocumentIndexStatus, StoreError> {
    Ok(match s {
        "PENDING" => DocumentIndexStatus::Pending,
        "CREATING" => DocumentIndexStatus::Creating,
        "ACTIVE" => DocumentIndexStatus::Active,
        "DELETING" => DocumentIndexStatus::Deleting,
        "DELETION_IN_PROGRESS" => DocumentIndexStatus::DeletionInProgress,
        "FAILED" => DocumentIndexStatus::Failed,
        other => return Err(StoreError::Fatal(anyhow::anyhow!("unknown document_index status {other}"))),
    })
}

fn summary_status_from_sql(s: &str) -> Result<CollectionSummaryStatus, StoreError> {
    Ok(match s {
        "PENDING" => CollectionSummaryStatus::Pending,
        "GENERATING" => CollectionSummaryStatus::Generating,
        "COMPLETE" => CollectionSummaryStatus::Complete,
        "FAILED" => CollectionSummaryStatus::Failed,
        other => return Err(StoreError::Fatal(anyhow::anyhow!("unknown summary status {other}"))),
    })
}

fn row_to_document_index(row: &Row) -> Result<DocumentIndex, StoreError> {
    let index_type: String = row.get("index_type");
    let status: String = row.get("status");
    Ok(DocumentIndex {
        document_id: DocumentId(row.get("document_id")),
        index_type: IndexType::from_str(&index_type)
            .map_err(|e| StoreError::Fatal(anyhow::anyhow!(e.to_string())))?,
        status: status_from_sql(&status)?,
        version: row.get("version"),
        observed_version: row.get("observed_version"),
        index_data: row.get("index_data"),
        error_message: row.get("error_message"),
        gmt_updated: row.get("gmt_updated"),
        gmt_last_reconciled: row.get("gmt_last_reconciled"),
    })
}

fn row_to_summary(row: &Row) -> Result<CollectionSummary, StoreError> {
    let status: String = row.get("status");
    Ok(CollectionSummary {
        id: SummaryId(row.get("id")),
        collection_id: CollectionId(row.get("collection_id")),
        summary: row.get("summary"),
        status: summary_status_from_sql(&status)?,
        version: row.get("version"),
        observed_version: row.get("observed_version"),
        error_message: row.get("error_message"),
        gmt_updated: row.get("gmt_updated"),
        gmt_last_reconciled: row.get("gmt_last_reconciled"),
    })
}

fn row_to_collection(row: &Row) -> Collection {
    let status: String = row.get("status");
    Collection {
        id: CollectionId(row.get("id")),
        status: if status == "ACTIVE" {
            CollectionStatus::Active
        } else {
            CollectionStatus::Deleted
        },
        config: row.get("config"),
        description: row.get("description"),
        gmt_updated: row.get("gmt_updated"),
        gmt_deleted: row.get("gmt_deleted"),
    }
}

#[async_trait]
impl StateStore for PostgresStore {
    async fn scan_create_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                "SELECT * FROM document_indexes WHERE status = 'PENDING' \
                 AND observed_version < version AND version = 1",
                &[],
            )
            .await?;
        rows.iter().map(row_to_document_index).collect()
    }

    async fn scan_update_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                "SELECT * FROM document_indexes WHERE status = 'PENDING' \
                 AND observed_version < version AND version > 1",
                &[],
            )
            .await?;
        rows.iter().map(row_to_document_index).collect()
    }

    async fn scan_delete_candidates(&self) -> Result<Vec<DocumentIndex>, StoreError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query("SELECT * FROM document_indexes WHERE status = 'DELETING'", &[])
            .await?;
        rows.iter().map(row_to_document_index).collect()
    }

    async fn claim_create(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE document_indexes SET status = $1, gmt_updated = $2, gmt_last_reconciled = $2 \
                 WHERE document_id = $3 AND index_type = $4 AND status = 'PENDING' \
                 AND observed_version < version AND version = 1",
                &[&status_to_sql(DocumentIndexStatus::Creating), &now, &document_id.0, &index_type.as_str()],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn claim_update(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE document_indexes SET status = $1, gmt_updated = $2, gmt_last_reconciled = $2 \
                 WHERE document_id = $3 AND index_type = $4 AND status = 'PENDING' \
                 AND observed_version < version AND version > 1",
                &[&status_to_sql(DocumentIndexStatus::Creating), &now, &document_id.0, &index_type.as_str()],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn claim_delete(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE document_indexes SET status = $1, gmt_updated = $2, gmt_last_reconciled = $2 \
                 WHERE document_id = $3 AND index_type = $4 AND status = 'DELETING'",
                &[&status_to_sql(DocumentIndexStatus::DeletionInProgress), &now, &document_id.0, &index_type.as_str()],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn revert_create_or_update_claim(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        target_version: i64,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE document_indexes SET status = $1, gmt_updated = $2 \
                 WHERE document_id = $3 AND index_type = $4 AND status = 'CREATING' AND version = $5",
                &[
                    &status_to_sql(DocumentIndexStatus::Pending),
                    &now,
                    &document_id.0,
                    &index_type.as_str(),
                    &target_version,
                ],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn revert_delete_claim(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE document_indexes SET status = $1, gmt_updated = $2 \
                 WHERE document_id = $3 AND index_type = $4 AND status = 'DELETION_IN_PROGRESS'",
                &[&status_to_sql(DocumentIndexStatus::Deleting), &now, &document_id.0, &index_type.as_str()],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn complete_index_creation(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        target_version: i64,
        index_data: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE document_indexes SET status = $1, observed_version = $2, index_data = $3, \
                 error_message = NULL, gmt_updated = $4, gmt_last_reconciled = $4 \
                 WHERE document_id = $5 AND index_type = $6 AND status = 'CREATING' AND version = $2",
                &[
                    &status_to_sql(DocumentIndexStatus::Active),
                    &target_version,
                    &index_data,
                    &now,
                    &document_id.0,
                    &index_type.as_str(),
                ],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn fail_index(
        &self,
        document_id: &DocumentId,
        index_type: IndexType,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE document_indexes SET status = $1, error_message = $2, gmt_updated = $3, \
                 gmt_last_reconciled = $3 \
                 WHERE document_id = $4 AND index_type = $5 AND status IN ('CREATING', 'DELETION_IN_PROGRESS')",
                &[
                    &status_to_sql(DocumentIndexStatus::Failed),
                    &error_message,
                    &now,
                    &document_id.0,
                    &index_type.as_str(),
                ],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn delete_index(&self, document_id: &DocumentId, index_type: IndexType) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "DELETE FROM document_indexes WHERE document_id = $1 AND index_type = $2 \
                 AND status = 'DELETION_IN_PROGRESS'",
                &[&document_id.0, &index_type.as_str()],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn get_document(&self, document_id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_opt("SELECT status FROM documents WHERE id = $1", &[&document_id.0])
            .await?;
        Ok(row.map(|r| {
            let status: String = r.get("status");
            Document {
                id: document_id.clone(),
                status: document_status_from_sql(&status),
            }
        }))
    }

    async fn get_document_index_rows(&self, document_id: &DocumentId) -> Result<Vec<DocumentIndex>, StoreError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query("SELECT * FROM document_indexes WHERE document_id = $1", &[&document_id.0])
            .await?;
        rows.iter().map(row_to_document_index).collect()
    }

    async fn set_document_status(
        &self,
        document_id: &DocumentId,
        status: DocumentStatus,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE documents SET status = $1 WHERE id = $2 \
                 AND status NOT IN ('DELETED', 'UPLOADED', 'EXPIRED')",
                &[&document_status_to_sql(status), &document_id.0],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn scan_summary_candidates(&self) -> Result<Vec<CollectionSummary>, StoreError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                "SELECT * FROM collection_summaries WHERE status = 'PENDING' AND observed_version != version",
                &[],
            )
            .await?;
        rows.iter().map(row_to_summary).collect()
    }

    async fn get_summary(&self, summary_id: &SummaryId) -> Result<Option<CollectionSummary>, StoreError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_opt("SELECT * FROM collection_summaries WHERE id = $1", &[&summary_id.0])
            .await?;
        row.as_ref().map(row_to_summary).transpose()
    }

    async fn claim_summary(
        &self,
        summary_id: &SummaryId,
        version_at_scan: i64,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE collection_summaries SET status = 'GENERATING', gmt_updated = $1, \
                 gmt_last_reconciled = $1 \
                 WHERE id = $2 AND status != 'GENERATING' AND version = $3",
                &[&now, &summary_id.0, &version_at_scan],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn complete_summary(
        &self,
        summary_id: &SummaryId,
        target_version: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE collection_summaries SET status = 'COMPLETE', summary = $1, \
                 observed_version = $2, error_message = NULL, gmt_updated = $3 \
                 WHERE id = $4 AND status = 'GENERATING' AND version = $2",
                &[&content, &target_version, &now, &summary_id.0],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn fail_summary(
        &self,
        summary_id: &SummaryId,
        target_version: i64,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE collection_summaries SET status = 'FAILED', error_message = $1, gmt_updated = $2 \
                 WHERE id = $3 AND status = 'GENERATING' AND version = $4",
                &[&error_message, &now, &summary_id.0, &target_version],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn get_collection(&self, collection_id: &CollectionId) -> Result<Option<Collection>, StoreError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_opt("SELECT * FROM collections WHERE id = $1", &[&collection_id.0])
            .await?;
        Ok(row.as_ref().map(row_to_collection))
    }

    async fn set_collection_description(
        &self,
        collection_id: &CollectionId,
        description: &str,
        expected_gmt_updated: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RowsAffected, StoreError> {
        let conn = self.pool.get().await?;
        let n = conn
            .execute(
                "UPDATE collections SET description = $1, gmt_updated = $2 \
                 WHERE id = $3 AND gmt_updated = $4 AND gmt_deleted IS NULL",
                &[&description, &now, &collection_id.0, &expected_gmt_updated],
            )
            .await?;
        Ok(RowsAffected(n))
    }

    async fn scan_active_collections(&self) -> Result<Vec<Collection>, StoreError> {
        let conn = self.pool.get().await?;
        let rows = conn.query("SELECT * FROM collections WHERE status = 'ACTIVE'", &[]).await?;
        Ok(rows.iter().map(row_to_collection).collect())
    }
}

fn document_status_to_sql(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Uploaded => "UPLOADED",
        DocumentStatus::Deleted => "DELETED",
        DocumentStatus::Expired => "EXPIRED",
        DocumentStatus::Running => "RUNNING",
        DocumentStatus::Complete => "COMPLETE",
        DocumentStatus::Failed => "FAILED",
        DocumentStatus::Pending => "PENDING",
    }
}

fn document_status_from_sql(s: &str) -> DocumentStatus {
    match s {
        "UPLOADED" => DocumentStatus::Uploaded,
        "DELETED" => DocumentStatus::Deleted,
        "EXPIRED" => DocumentStatus::Expired,
        "RUNNING" => DocumentStatus::Running,
        "COMPLETE" => DocumentStatus::Complete,
        "FAILED" => DocumentStatus::Failed,
        _ => DocumentStatus::Pending,
    }
}
