//! C8: derives a document's overall status from its `DocumentIndex` rows.
//! Grounded on the original's `Document.get_overall_index_status` call
//! from `_update_document_status` (`aperag/tasks/reconciler.py`); the
//! exact rule below is the Open Question decision recorded in
//! `SPEC_FULL.md` §4 (C8) and `DESIGN.md`.

use std::collections::BTreeSet;

use common::IndexType;
use model::{DocumentIndex, DocumentIndexStatus, DocumentStatus};

/// Narrows a document's rows to the operator-enabled index types
/// (`spec.md` §6 configuration) before handing them to [`aggregate`] —
/// config-driven filtering lives with the caller, not with the pure
/// aggregation rule.
pub fn enabled_statuses(rows: &[DocumentIndex], enabled: &BTreeSet<IndexType>) -> Vec<DocumentIndexStatus> {
    rows.iter().filter(|r| enabled.contains(&r.index_type)).map(|r| r.status).collect()
}

/// `rows` must already be narrowed to the index types the collection
/// actually wants (`SPEC_FULL.md` §4 C8: "restricted to the *enabled*
/// index types") — this function doesn't know about collection config.
pub fn aggregate(rows: &[DocumentIndexStatus]) -> DocumentStatus {
    if rows.is_empty() {
        return DocumentStatus::Pending;
    }

    let any_in_flight = rows.iter().any(|s| s.is_in_flight());
    if any_in_flight {
        return DocumentStatus::Running;
    }

    let any_failed = rows.contains(&DocumentIndexStatus::Failed);
    if any_failed {
        return DocumentStatus::Failed;
    }

    DocumentStatus::Complete
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_pending() {
        assert_eq!(aggregate(&[]), DocumentStatus::Pending);
    }

    #[test]
    fn all_active_is_complete() {
        let rows = [DocumentIndexStatus::Active, DocumentIndexStatus::Active];
        assert_eq!(aggregate(&rows), DocumentStatus::Complete);
    }

    #[test]
    fn any_failed_with_nothing_in_flight_is_failed() {
        let rows = [DocumentIndexStatus::Active, DocumentIndexStatus::Failed];
        assert_eq!(aggregate(&rows), DocumentStatus::Failed);
    }

    #[test]
    fn in_flight_beats_stale_failed() {
        // S5: a FAILED row moves to PENDING then CREATING on retry; the
        // aggregator must not keep reporting FAILED.
        let rows = [DocumentIndexStatus::Failed, DocumentIndexStatus::Creating];
        assert_eq!(aggregate(&rows), DocumentStatus::Running);
    }

    #[test]
    fn any_pending_or_deleting_is_running() {
        assert_eq!(aggregate(&[DocumentIndexStatus::Pending]), DocumentStatus::Running);
        assert_eq!(aggregate(&[DocumentIndexStatus::Deleting]), DocumentStatus::Running);
    }
}
