//! The backend adapter capability set.
//!
//! Each infrastructure provider (hyperscale region, edge cluster) exposes
//! the same operations. Calls may cross a process or network boundary,
//! so every I/O-shaped operation returns a boxed `Send` future. This keeps
//! the trait object-safe: the registry stores `Arc<dyn BackendAdapter>`.

use std::future::Future;
use std::pin::Pin;

use fedgrid_core::{AdapterHealth, Node, ProviderTag, Region, Workload};

use crate::error::AdapterResult;

/// Boxed future alias for adapter call results.
pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = AdapterResult<T>> + Send + 'a>>;

/// Outcome of a reservation attempt that reached the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    /// Capacity committed. Carries the node as it looks afterwards.
    Reserved(Node),
    /// Nothing changed.
    Rejected(RejectReason),
}

/// Why a backend refused a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownNode,
    NodeUnavailable,
    InsufficientCapacity,
}

impl Reservation {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Reservation::Reserved(_))
    }
}

/// Operations the scheduler needs from one infrastructure provider.
///
/// Implementations must make [`reserve`](BackendAdapter::reserve) atomic
/// with respect to its own capacity check: two concurrent reservations
/// against the same node must never both succeed if together they
/// exceed its free capacity.
pub trait BackendAdapter: Send + Sync {
    /// Which provider this adapter speaks for.
    fn provider(&self) -> ProviderTag;

    /// Enumerate nodes, optionally restricted to one region.
    fn list_nodes<'a>(&'a self, region: Option<&'a str>) -> AdapterFuture<'a, Vec<Node>>;

    /// Fetch a single node snapshot.
    fn get_node<'a>(&'a self, node_id: &'a str) -> AdapterFuture<'a, Option<Node>>;

    /// Verify free capacity covers the workload's request and commit it.
    fn reserve<'a>(&'a self, node_id: &'a str, workload: &'a Workload) -> AdapterFuture<'a, Reservation>;

    /// Give back what `workload_id` holds on `node_id`. Returns `false`
    /// if nothing was released.
    fn release<'a>(&'a self, node_id: &'a str, workload_id: &'a str) -> AdapterFuture<'a, bool>;

    /// Regions this provider offers.
    fn list_regions(&self) -> AdapterFuture<'_, Vec<Region>>;

    /// Advisory health; never consulted by placement.
    fn health_check(&self) -> AdapterFuture<'_, AdapterHealth>;
}
