use chrono::{DateTime, Utc};
use common::{CollectionId, SummaryId};

use crate::status::CollectionSummaryStatus;

/// One row per collection when summarisation is enabled.
///
/// `id` is distinct from `collection_id` so callbacks keyed by
/// `summary_id` don't have to assume a 1:1 table-key relationship even
/// though today's `DocumentIndexReconciler`-equivalent only ever creates
/// one summary row per collection.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionSummary {
    pub id: SummaryId,
    pub collection_id: CollectionId,
    pub summary: Option<String>,
    pub status: CollectionSummaryStatus,
    pub version: i64,
    pub observed_version: i64,
    pub error_message: Option<String>,
    pub gmt_updated: DateTime<Utc>,
    pub gmt_last_reconciled: DateTime<Utc>,
}

impl CollectionSummary {
    pub fn new_pending(id: SummaryId, collection_id: CollectionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            collection_id,
            summary: None,
            status: CollectionSummaryStatus::Pending,
            version: 1,
            observed_version: 0,
            error_message: None,
            gmt_updated: now,
            gmt_last_reconciled: now,
        }
    }
}
