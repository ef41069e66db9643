//! Database stores for sessions, documents, and clusters

pub mod clusters;
pub mod documents;
pub mod sessions;
