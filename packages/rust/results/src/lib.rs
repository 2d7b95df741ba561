//! Read side of the precomputed query results.
//!
//! [`ResultStore`] loads the keyed-result collection and serves lookups;
//! every looked-up result goes through [`normalize`], which reshapes lists of
//! graph paths into a deduplicated `{nodes, edges}` view.

pub mod normalizer;
pub mod store;

pub use normalizer::{CanonicalView, PathRecord, ResultItem, normalize};
pub use store::ResultStore;
