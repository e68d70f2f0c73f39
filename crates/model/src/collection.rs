use chrono::{DateTime, Utc};
use common::CollectionId;

use crate::status::CollectionStatus;

/// Owns configuration (including `enable_summary`) and an optional
/// `description` the summary callback may overwrite. Sharing, quota, and
/// marketplace concerns live elsewhere and aren't modeled here.
#[derive(Clone, Debug, PartialEq)]
pub struct Collection {
    pub id: CollectionId,
    pub status: CollectionStatus,
    /// Opaque configuration blob; see `config::parse_collection_config`.
    pub config: String,
    pub description: Option<String>,
    pub gmt_updated: DateTime<Utc>,
    pub gmt_deleted: Option<DateTime<Utc>>,
}

impl Collection {
    pub fn is_deleted(&self) -> bool {
        self.gmt_deleted.is_some()
    }
}
