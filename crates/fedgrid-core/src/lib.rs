//! fedgrid-core: shared data model for the federated scheduler.
//!
//! Nodes, workloads, and placement results are plain values. Behavior
//! lives elsewhere: adapters own and mutate nodes, the placement crate
//! filters and scores them, the scheduler commits placements.

pub mod config;
pub mod types;

pub use config::FleetConfig;
pub use types::*;
