use common::DocumentId;

/// A document's own lifecycle status. The aggregator only overwrites this
/// with a derived value while the document isn't `Uploaded`, `Deleted`, or
/// `Expired` — those three are terminal/external and never overridden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentStatus {
    Uploaded,
    Deleted,
    Expired,
    /// Derived by the aggregator from the document's `DocumentIndex` rows;
    /// see `reconcile::aggregator`.
    Running,
    Complete,
    Failed,
    Pending,
}

impl DocumentStatus {
    /// §3: the aggregator only overrides a document's status while it is
    /// not in one of these three.
    pub fn is_aggregator_exempt(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Uploaded | DocumentStatus::Deleted | DocumentStatus::Expired
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub status: DocumentStatus,
}
