//! Domain types and the `Runtime` abstraction shared by every crate in the
//! controller. Kept deliberately small: this is the ambient crate the
//! rest of the workspace depends on, scoped to what this controller
//! actually needs.

pub mod ids;
pub mod index_type;
pub mod runtime;

pub use ids::{CollectionId, DocumentId, SummaryId};
pub use index_type::IndexType;
pub use runtime::{Runtime, TokioRuntime};
