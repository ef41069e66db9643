//! Re-clustering: job coordination and the clustering engine seam

pub mod coordinator;
pub mod engine;

pub use coordinator::{ReclusterConfig, ReclusterCoordinator};
pub use engine::{
    ClusterProposal, ClusterableDocument, ClusteringEngine, KeywordGroupingEngine, ProgressFn,
};
