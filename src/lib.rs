//! fabric-dispatch core
//!
//! Bundles data-center work orders into compatible batches and walks
//! technician bundles through a multi-floor facility as a single loop.

pub mod traits;
pub mod error;
pub mod ticket;
pub mod ticket_feed;
pub mod task;
pub mod scoring;
pub mod bundling;
pub mod facility;
pub mod pathfinding;
pub mod route_path;
pub mod routing;
