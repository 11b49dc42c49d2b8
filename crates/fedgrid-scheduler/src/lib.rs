//! fedgrid-scheduler: commits workload placements across providers.
//!
//! The scheduler enumerates nodes from every registered adapter, filters
//! and scores them (`fedgrid-placement`), then walks the ranking asking
//! each owning adapter to reserve capacity until one succeeds.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── AdapterRegistry (provider → Arc<dyn BackendAdapter>, registration order)
//!   ├── filter_candidates() → rank_candidates()
//!   └── ranked walk: adapter.reserve() until first Reserved
//! ```
//!
//! The scheduler keeps no node state of its own. Adapters own
//! utilization and make each reservation atomic, so any number of
//! callers may schedule concurrently through a shared `Scheduler`.

pub mod batch;
pub mod error;
pub mod scheduler;

pub use batch::{DEFAULT_SHARD, GeoShard, geo_shards};
pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::{NodeQuery, Scheduler};
