use serde::{Deserialize, Serialize};

/// `{PENDING, CREATING, ACTIVE, DELETING, DELETION_IN_PROGRESS, FAILED}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentIndexStatus {
    Pending,
    Creating,
    Active,
    Deleting,
    DeletionInProgress,
    Failed,
}

impl DocumentIndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentIndexStatus::Pending => "PENDING",
            DocumentIndexStatus::Creating => "CREATING",
            DocumentIndexStatus::Active => "ACTIVE",
            DocumentIndexStatus::Deleting => "DELETING",
            DocumentIndexStatus::DeletionInProgress => "DELETION_IN_PROGRESS",
            DocumentIndexStatus::Failed => "FAILED",
        }
    }

    /// Is a task in flight for this row?
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            DocumentIndexStatus::Pending
                | DocumentIndexStatus::Creating
                | DocumentIndexStatus::Deleting
                | DocumentIndexStatus::DeletionInProgress
        )
    }
}

/// `{PENDING, GENERATING, COMPLETE, FAILED}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionSummaryStatus {
    Pending,
    Generating,
    Complete,
    Failed,
}

impl CollectionSummaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionSummaryStatus::Pending => "PENDING",
            CollectionSummaryStatus::Generating => "GENERATING",
            CollectionSummaryStatus::Complete => "COMPLETE",
            CollectionSummaryStatus::Failed => "FAILED",
        }
    }
}

/// Collection lifecycle status, as referenced by the GC reconciler (C7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionStatus {
    Active,
    Deleted,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Active => "ACTIVE",
            CollectionStatus::Deleted => "DELETED",
        }
    }
}
