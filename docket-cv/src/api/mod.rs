//! HTTP API handlers

pub mod clusters;
pub mod documents;
pub mod health;
pub mod recluster;
pub mod sessions;
pub mod uncertain;

pub use clusters::cluster_routes;
pub use documents::document_routes;
pub use health::health_routes;
pub use recluster::recluster_routes;
pub use sessions::session_routes;
pub use uncertain::uncertain_routes;
