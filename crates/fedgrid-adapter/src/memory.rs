//! In-memory provider adapter.
//!
//! Holds a provider's nodes in process memory behind a single
//! `tokio::sync::Mutex`. Every reservation checks free capacity and
//! commits under one lock acquisition, so concurrent schedulers can
//! never over-commit a node.
//!
//! A ledger records exactly what each workload reserved on each node,
//! which lets `release` reverse a `reserve` precisely.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use fedgrid_core::{
    AdapterHealth, DEFAULT_BUSY_THRESHOLD, Node, NodeId, NodeStatus, ProviderTag, Region, Resources,
    WorkloadId, Workload,
};

use crate::adapter::{AdapterFuture, BackendAdapter, RejectReason, Reservation};

/// A node plus the adapter-private bits that drive its status.
#[derive(Debug)]
struct Slot {
    node: Node,
    online: bool,
}

#[derive(Debug, Default)]
struct State {
    /// Nodes in enumeration order.
    slots: Vec<Slot>,
    /// (node id, workload id) → resources reserved.
    ledger: HashMap<(NodeId, WorkloadId), Resources>,
}

impl State {
    fn slot_mut(&mut self, node_id: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.node.id == node_id)
    }
}

/// A provider adapter whose nodes live in memory.
#[derive(Debug)]
pub struct InMemoryAdapter {
    provider: ProviderTag,
    regions: Vec<Region>,
    busy_threshold: f64,
    healthy: AtomicBool,
    state: Mutex<State>,
}

impl InMemoryAdapter {
    /// Create an adapter owning `nodes`.
    ///
    /// Every node is stamped with this adapter's provider and its status
    /// is re-derived from its utilization. A node that arrives with
    /// status `Unavailable` stays offline.
    pub fn new(provider: ProviderTag, regions: Vec<Region>, nodes: Vec<Node>) -> Self {
        Self::with_busy_threshold(provider, regions, nodes, DEFAULT_BUSY_THRESHOLD)
    }

    pub fn with_busy_threshold(
        provider: ProviderTag,
        regions: Vec<Region>,
        nodes: Vec<Node>,
        busy_threshold: f64,
    ) -> Self {
        let slots = nodes
            .into_iter()
            .map(|mut node| {
                let online = node.status != NodeStatus::Unavailable;
                node.provider = provider;
                node.status =
                    NodeStatus::derive(online, &node.capacity, &node.utilization, busy_threshold);
                Slot { node, online }
            })
            .collect();

        Self {
            provider,
            regions,
            busy_threshold,
            healthy: AtomicBool::new(true),
            state: Mutex::new(State {
                slots,
                ledger: HashMap::new(),
            }),
        }
    }

    /// Mark the whole backend up or down.
    ///
    /// A down backend enumerates no nodes and refuses reservations.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
        info!(provider = %self.provider, healthy, "adapter health changed");
    }

    /// Take a node offline or bring it back. Returns `false` for unknown nodes.
    pub async fn set_online(&self, node_id: &str, online: bool) -> bool {
        let mut state = self.state.lock().await;
        let threshold = self.busy_threshold;
        match state.slot_mut(node_id) {
            Some(slot) => {
                slot.online = online;
                refresh_status(slot, threshold);
                debug!(provider = %self.provider, node = %node_id, online, "node availability changed");
                true
            }
            None => false,
        }
    }

    /// Number of live ledger entries (reservations not yet released).
    pub async fn active_reservations(&self) -> usize {
        self.state.lock().await.ledger.len()
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

fn refresh_status(slot: &mut Slot, busy_threshold: f64) {
    slot.node.status = NodeStatus::derive(
        slot.online,
        &slot.node.capacity,
        &slot.node.utilization,
        busy_threshold,
    );
}

impl BackendAdapter for InMemoryAdapter {
    fn provider(&self) -> ProviderTag {
        self.provider
    }

    fn list_nodes<'a>(&'a self, region: Option<&'a str>) -> AdapterFuture<'a, Vec<Node>> {
        Box::pin(async move {
            if !self.is_healthy() {
                return Ok(Vec::new());
            }
            let state = self.state.lock().await;
            Ok(state
                .slots
                .iter()
                .filter(|s| region.is_none_or(|r| s.node.region() == r))
                .map(|s| s.node.clone())
                .collect())
        })
    }

    fn get_node<'a>(&'a self, node_id: &'a str) -> AdapterFuture<'a, Option<Node>> {
        Box::pin(async move {
            if !self.is_healthy() {
                return Ok(None);
            }
            let state = self.state.lock().await;
            Ok(state
                .slots
                .iter()
                .find(|s| s.node.id == node_id)
                .map(|s| s.node.clone()))
        })
    }

    fn reserve<'a>(&'a self, node_id: &'a str, workload: &'a Workload) -> AdapterFuture<'a, Reservation> {
        Box::pin(async move {
            if !self.is_healthy() {
                return Ok(Reservation::Rejected(RejectReason::NodeUnavailable));
            }

            // Check and commit under one guard.
            let mut state = self.state.lock().await;
            let threshold = self.busy_threshold;
            let Some(slot) = state.slot_mut(node_id) else {
                return Ok(Reservation::Rejected(RejectReason::UnknownNode));
            };
            if !slot.online {
                return Ok(Reservation::Rejected(RejectReason::NodeUnavailable));
            }
            if !slot.node.can_fit(&workload.resources) {
                debug!(
                    provider = %self.provider,
                    node = %node_id,
                    workload = %workload.id,
                    "reservation refused, insufficient capacity"
                );
                return Ok(Reservation::Rejected(RejectReason::InsufficientCapacity));
            }

            slot.node.utilization.add(&workload.resources);
            refresh_status(slot, threshold);
            let snapshot = slot.node.clone();

            state
                .ledger
                .entry((node_id.to_string(), workload.id.clone()))
                .and_modify(|held| held.add(&workload.resources))
                .or_insert_with(|| workload.resources.clone());

            debug!(
                provider = %self.provider,
                node = %node_id,
                workload = %workload.id,
                status = ?snapshot.status,
                "capacity reserved"
            );
            Ok(Reservation::Reserved(snapshot))
        })
    }

    fn release<'a>(&'a self, node_id: &'a str, workload_id: &'a str) -> AdapterFuture<'a, bool> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let key = (node_id.to_string(), workload_id.to_string());
            let Some(held) = state.ledger.remove(&key) else {
                warn!(
                    provider = %self.provider,
                    node = %node_id,
                    workload = %workload_id,
                    "release for unknown reservation"
                );
                return Ok(false);
            };

            let threshold = self.busy_threshold;
            match state.slot_mut(node_id) {
                Some(slot) => {
                    slot.node.utilization.subtract(&held);
                    refresh_status(slot, threshold);
                    debug!(provider = %self.provider, node = %node_id, workload = %workload_id, "capacity released");
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn list_regions(&self) -> AdapterFuture<'_, Vec<Region>> {
        Box::pin(async move { Ok(self.regions.clone()) })
    }

    fn health_check(&self) -> AdapterFuture<'_, AdapterHealth> {
        Box::pin(async move {
            Ok(if self.is_healthy() {
                AdapterHealth::Healthy
            } else {
                AdapterHealth::Unhealthy
            })
        })
    }
}
