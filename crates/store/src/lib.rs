//! The state store: a trait of conditional, predicate-guarded mutations
//! plus scan queries — "update WHERE id = X AND status = Y AND
//! version = Z" and report rows-affected rather than a bare bool.
//!
//! Two implementations behind one trait: [`postgres::PostgresStore`] for
//! production, [`memory::InMemoryStore`] for tests.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::StoreError;
pub use traits::{RowsAffected, StateStore};
