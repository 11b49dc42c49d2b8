//! fedgrid-adapter: the boundary between the scheduler and each
//! infrastructure provider.
//!
//! # Components
//!
//! - **`adapter`**: `BackendAdapter`, the capability set every provider implements
//! - **`memory`**: `InMemoryAdapter`, a provider whose nodes live in process memory
//! - **`registry`**: `AdapterRegistry`, adapters keyed by provider identity
//! - **`fleet`**: builds in-memory adapters from a fleet file
//!
//! # Atomicity
//!
//! Adapters own node utilization. `reserve` must check free capacity and
//! commit the reservation as one step; the scheduler cannot enforce this
//! from outside.

pub mod adapter;
pub mod error;
pub mod fleet;
pub mod memory;
pub mod registry;

pub use adapter::{AdapterFuture, BackendAdapter, RejectReason, Reservation};
pub use error::{AdapterError, AdapterResult};
pub use fleet::adapters_from_config;
pub use memory::InMemoryAdapter;
pub use registry::AdapterRegistry;
