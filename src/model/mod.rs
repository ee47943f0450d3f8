//! Core data model types for merkle_forest

mod diff;
mod hash;
mod path;

pub use diff::TrieDiff;
pub use hash::Hash;
pub use path::{common_prefix_len, BitPath};
