//! Fleet file → in-memory adapters.

use std::sync::Arc;

use tracing::debug;

use fedgrid_core::config::{AdapterConfig, NodeConfig};
use fedgrid_core::{
    DEFAULT_BUSY_THRESHOLD, FleetConfig, Location, Node, NodeStatus, Region, Resources,
};

use crate::memory::InMemoryAdapter;

/// Build one in-memory adapter per `[[adapters]]` entry, in file order.
pub fn adapters_from_config(config: &FleetConfig) -> Vec<Arc<InMemoryAdapter>> {
    config.adapters.iter().map(|a| Arc::new(adapter_from_config(a))).collect()
}

fn adapter_from_config(cfg: &AdapterConfig) -> InMemoryAdapter {
    let regions = cfg
        .regions
        .iter()
        .map(|r| Region {
            id: r.id.clone(),
            name: r.name.clone().unwrap_or_else(|| r.id.clone()),
            provider: cfg.provider,
            latitude: r.latitude,
            longitude: r.longitude,
        })
        .collect();

    let nodes: Vec<Node> = cfg.nodes.iter().map(|n| node_from_config(cfg, n)).collect();
    debug!(provider = %cfg.provider, nodes = nodes.len(), "adapter built from fleet file");

    let adapter = InMemoryAdapter::with_busy_threshold(
        cfg.provider,
        regions,
        nodes,
        cfg.busy_threshold.unwrap_or(DEFAULT_BUSY_THRESHOLD),
    );
    if cfg.healthy == Some(false) {
        adapter.set_healthy(false);
    }
    adapter
}

fn node_from_config(adapter: &AdapterConfig, n: &NodeConfig) -> Node {
    let capacity = Resources {
        cpu_millis: n.cpu_millis,
        memory_mb: n.memory_mb,
        storage_gb: n.storage_gb,
        gpu: n.gpu,
    };
    // Utilization mirrors which optional dimensions exist.
    let utilization = Resources {
        cpu_millis: 0,
        memory_mb: 0,
        storage_gb: n.storage_gb.map(|_| 0),
        gpu: n.gpu.map(|_| 0),
    };
    Node {
        id: n.id.clone(),
        provider: adapter.provider,
        location: Location {
            region: n.region.clone(),
            latitude: n.latitude,
            longitude: n.longitude,
        },
        capacity,
        utilization,
        // Re-derived by the adapter; only Unavailable is carried through.
        status: if n.online == Some(false) {
            NodeStatus::Unavailable
        } else {
            NodeStatus::Available
        },
        labels: n.labels.clone(),
    }
}
