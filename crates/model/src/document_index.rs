use chrono::{DateTime, Utc};
use common::{DocumentId, IndexType};

use crate::status::DocumentIndexStatus;

/// One row per (document_id, index_type).
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentIndex {
    pub document_id: DocumentId,
    pub index_type: IndexType,
    pub status: DocumentIndexStatus,
    /// Monotonically increasing; bumped on every desired-state change.
    pub version: i64,
    /// Last version actually materialised. Invariant: `observed_version <= version`.
    pub observed_version: i64,
    pub index_data: Option<String>,
    pub error_message: Option<String>,
    pub gmt_updated: DateTime<Utc>,
    pub gmt_last_reconciled: DateTime<Utc>,
}

impl DocumentIndex {
    pub fn new_pending(document_id: DocumentId, index_type: IndexType, now: DateTime<Utc>) -> Self {
        Self {
            document_id,
            index_type,
            status: DocumentIndexStatus::Pending,
            version: 1,
            observed_version: 0,
            index_data: None,
            error_message: None,
            gmt_updated: now,
            gmt_last_reconciled: now,
        }
    }

    /// §3 invariant 1/2.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.observed_version > self.version {
            return Err(format!(
                "observed_version {} exceeds version {} for {}/{:?}",
                self.observed_version, self.version, self.document_id, self.index_type
            ));
        }
        if self.observed_version < self.version {
            if !self.status.is_in_flight() {
                return Err(format!(
                    "row {}/{:?} has observed_version < version but status {:?} is terminal",
                    self.document_id, self.index_type, self.status
                ));
            }
        } else if self.status != DocumentIndexStatus::Deleting
            && self.status != DocumentIndexStatus::DeletionInProgress
            && self.status != DocumentIndexStatus::Active
            && self.status != DocumentIndexStatus::Failed
        {
            return Err(format!(
                "row {}/{:?} has observed_version == version but status {:?} is neither ACTIVE nor FAILED",
                self.document_id, self.index_type, self.status
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(0, 0).unwrap()
    }

    #[test]
    fn new_pending_satisfies_invariants() {
        let row = DocumentIndex::new_pending("d1".into(), IndexType::Vector, now());
        row.check_invariants().unwrap();
    }

    #[test]
    fn observed_exceeding_version_is_invalid() {
        let mut row = DocumentIndex::new_pending("d1".into(), IndexType::Vector, now());
        row.observed_version = 5;
        row.version = 1;
        assert!(row.check_invariants().is_err());
    }
}
