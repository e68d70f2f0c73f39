//! Error classification shared across the controller.
//!
//! Mirrors the `ErrorMetadata` idiom: errors are tagged with a coarse
//! [`ErrorCode`] so call sites can decide whether to retry, back off, or
//! surface a per-document failure, without matching on error message text.

use std::borrow::Cow;

/// Attachable to an `anyhow` error chain via `.context(e /* ErrorMetadata */)`.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{msg}")]
pub struct ErrorMetadata {
    pub code: ErrorCode,
    /// Short, ScreamingCamelCase tag usable in tests and metrics.
    pub short_msg: Cow<'static, str>,
    /// Developer-facing, descriptive message.
    pub msg: Cow<'static, str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Lost a race to claim or update a row; expected under contention.
    OptimisticConcurrencyConflict,
    /// The store is unreachable or timed out; retry with backoff.
    Transient,
    /// A row was not found where the caller expected one.
    NotFound,
    /// Configuration (e.g. a collection's config blob) could not be parsed.
    ConfigParse,
    /// Anything else: a bug or an invariant violation worth paging on.
    Internal,
}

impl ErrorMetadata {
    pub fn occ_conflict(msg: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: ErrorCode::OptimisticConcurrencyConflict,
            short_msg: Cow::Borrowed("OptimisticConcurrencyConflict"),
            msg: msg.into(),
        }
    }

    pub fn transient(msg: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: ErrorCode::Transient,
            short_msg: Cow::Borrowed("Transient"),
            msg: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            short_msg: Cow::Borrowed("NotFound"),
            msg: msg.into(),
        }
    }

    pub fn config_parse(msg: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: ErrorCode::ConfigParse,
            short_msg: Cow::Borrowed("ConfigParse"),
            msg: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: ErrorCode::Internal,
            short_msg: Cow::Borrowed("Internal"),
            msg: msg.into(),
        }
    }

    pub fn is_occ(&self) -> bool {
        self.code == ErrorCode::OptimisticConcurrencyConflict
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.code, ErrorCode::Transient | ErrorCode::OptimisticConcurrencyConflict)
    }
}

/// Extension trait so call sites can ask `anyhow::Error::is_occ()` without
/// downcasting by hand at every call site.
pub trait ErrorMetadataAnyhowExt {
    fn metadata(&self) -> Option<&ErrorMetadata>;

    fn is_occ(&self) -> bool {
        self.metadata().is_some_and(ErrorMetadata::is_occ)
    }

    fn is_transient(&self) -> bool {
        self.metadata().is_some_and(ErrorMetadata::is_transient)
    }
}

impl ErrorMetadataAnyhowExt for anyhow::Error {
    fn metadata(&self) -> Option<&ErrorMetadata> {
        self.downcast_ref::<ErrorMetadata>()
    }
}

/// Logs an unexpected error at the level its classification deserves; used
/// at the boundary of a reconciler host loop.
pub fn report_error(err: &anyhow::Error) {
    if err.is_occ() {
        tracing::debug!(error = %err, "expected optimistic-concurrency conflict");
    } else if err.is_transient() {
        tracing::warn!(error = %err, "transient error, will retry");
    } else {
        tracing::error!(error = %err, "unexpected error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occ_is_transient_but_not_vice_versa() {
        let occ = ErrorMetadata::occ_conflict("lost claim race");
        assert!(occ.is_occ());
        assert!(occ.is_transient());

        let transient = ErrorMetadata::transient("connection reset");
        assert!(!transient.is_occ());
        assert!(transient.is_transient());
    }

    #[test]
    fn anyhow_ext_finds_metadata_in_chain() {
        let err = anyhow::anyhow!("claim failed").context(ErrorMetadata::occ_conflict("raced"));
        assert!(err.is_occ());
    }
}
