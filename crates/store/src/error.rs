use errors::ErrorMetadata;

/// `spec.md` §7: "Transient store error" and the predicate-conjunctive
/// update machinery. Note there is deliberately no `ClaimMiss` variant —
/// per §7, a claim miss (zero rows affected) is an *expected* outcome
/// under contention, not an error, so it is represented as
/// `Ok(RowsAffected(0))` rather than constructed as an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transient store error: {0}")]
    Transient(#[source] anyhow::Error),
    #[error("store error: {0}")]
    Fatal(#[source] anyhow::Error),
}

impl StoreError {
    pub fn metadata(&self) -> ErrorMetadata {
        match self {
            StoreError::Transient(e) => ErrorMetadata::transient(e.to_string()),
            StoreError::Fatal(e) => ErrorMetadata::internal(e.to_string()),
        }
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        // Connection-level errors (closed socket, timeout) are transient;
        // anything else (constraint violation, bad query) is a bug.
        if e.is_closed() {
            StoreError::Transient(e.into())
        } else {
            StoreError::Fatal(e.into())
        }
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        StoreError::Transient(anyhow::anyhow!(e))
    }
}
