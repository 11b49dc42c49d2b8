//! Domain types for the federated scheduler.
//!
//! These types describe reservable nodes, placement requests, and the
//! results and reports the scheduler hands back. All types serialize
//! to/from JSON for the CLI and TOML for fleet files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a node (unique within its provider).
pub type NodeId = String;

/// Caller-supplied identifier for a workload.
pub type WorkloadId = String;

/// Utilization ratio at or above which a node reports `Busy`.
pub const DEFAULT_BUSY_THRESHOLD: f64 = 0.8;

// ── Provider ──────────────────────────────────────────────────────

/// Which backend adapter owns a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderTag {
    HyperscaleA,
    HyperscaleB,
    HyperscaleC,
    Edge,
}

impl ProviderTag {
    pub const ALL: [ProviderTag; 4] = [
        ProviderTag::HyperscaleA,
        ProviderTag::HyperscaleB,
        ProviderTag::HyperscaleC,
        ProviderTag::Edge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTag::HyperscaleA => "hyperscale-a",
            ProviderTag::HyperscaleB => "hyperscale-b",
            ProviderTag::HyperscaleC => "hyperscale-c",
            ProviderTag::Edge => "edge",
        }
    }

    /// Whether this provider is edge-class (eligible for the latency bonus).
    pub fn is_edge(&self) -> bool {
        matches!(self, ProviderTag::Edge)
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderTag::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown provider: {s}"))
    }
}

// ── Resources ─────────────────────────────────────────────────────

/// A bundle of resource quantities.
///
/// Used for node capacity, node utilization, and workload requests.
/// Storage and GPU are optional: on a node `None` means "none installed",
/// on a request `None` means "not requested, don't check".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// CPU in millicores.
    pub cpu_millis: u64,
    /// Memory in MB.
    pub memory_mb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<u32>,
}

impl Resources {
    pub fn new(cpu_millis: u64, memory_mb: u64) -> Self {
        Self {
            cpu_millis,
            memory_mb,
            storage_gb: None,
            gpu: None,
        }
    }

    pub fn with_storage(mut self, storage_gb: u64) -> Self {
        self.storage_gb = Some(storage_gb);
        self
    }

    pub fn with_gpu(mut self, gpu: u32) -> Self {
        self.gpu = Some(gpu);
        self
    }

    /// What's left of `self` (a capacity) once `used` is taken out.
    pub fn remaining(&self, used: &Resources) -> Resources {
        Resources {
            cpu_millis: self.cpu_millis.saturating_sub(used.cpu_millis),
            memory_mb: self.memory_mb.saturating_sub(used.memory_mb),
            storage_gb: self
                .storage_gb
                .map(|cap| cap.saturating_sub(used.storage_gb.unwrap_or(0))),
            gpu: self.gpu.map(|cap| cap.saturating_sub(used.gpu.unwrap_or(0))),
        }
    }

    /// Whether `self` (free resources) satisfies `request` on every
    /// requested dimension.
    pub fn covers(&self, request: &Resources) -> bool {
        if self.cpu_millis < request.cpu_millis || self.memory_mb < request.memory_mb {
            return false;
        }
        if let Some(storage) = request.storage_gb {
            if self.storage_gb.unwrap_or(0) < storage {
                return false;
            }
        }
        if let Some(gpu) = request.gpu {
            if self.gpu.unwrap_or(0) < gpu {
                return false;
            }
        }
        true
    }

    /// Add `other` onto `self`. Optional dimensions become `Some` once
    /// either side carries a value.
    pub fn add(&mut self, other: &Resources) {
        self.cpu_millis = self.cpu_millis.saturating_add(other.cpu_millis);
        self.memory_mb = self.memory_mb.saturating_add(other.memory_mb);
        self.storage_gb = add_opt(self.storage_gb, other.storage_gb, u64::saturating_add);
        self.gpu = add_opt(self.gpu, other.gpu, u32::saturating_add);
    }

    /// Subtract `other` from `self`, clamping at zero.
    pub fn subtract(&mut self, other: &Resources) {
        self.cpu_millis = self.cpu_millis.saturating_sub(other.cpu_millis);
        self.memory_mb = self.memory_mb.saturating_sub(other.memory_mb);
        if let (Some(cur), Some(delta)) = (self.storage_gb, other.storage_gb) {
            self.storage_gb = Some(cur.saturating_sub(delta));
        }
        if let (Some(cur), Some(delta)) = (self.gpu, other.gpu) {
            self.gpu = Some(cur.saturating_sub(delta));
        }
    }
}

fn add_opt<T: Copy>(a: Option<T>, b: Option<T>, add: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(add(a, b)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

/// Fraction of `capacity` that `used` occupies. Zero capacity counts as
/// fully consumed.
pub fn utilization_ratio(used: u64, capacity: u64) -> f64 {
    if capacity == 0 {
        1.0
    } else {
        used as f64 / capacity as f64
    }
}

// ── Node ──────────────────────────────────────────────────────────

/// Where a node lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            latitude: None,
            longitude: None,
        }
    }
}

/// Scheduling status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Available,
    Busy,
    Unavailable,
}

impl NodeStatus {
    /// Derive status from the node's load. Only the owning adapter
    /// decides `online`; everything else follows from the numbers.
    pub fn derive(online: bool, capacity: &Resources, used: &Resources, busy_threshold: f64) -> Self {
        if !online {
            return NodeStatus::Unavailable;
        }
        let cpu = utilization_ratio(used.cpu_millis, capacity.cpu_millis);
        let mem = utilization_ratio(used.memory_mb, capacity.memory_mb);
        if cpu.max(mem) >= busy_threshold {
            NodeStatus::Busy
        } else {
            NodeStatus::Available
        }
    }
}

/// A reservable unit of compute owned by exactly one provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub provider: ProviderTag,
    pub location: Location,
    pub capacity: Resources,
    pub utilization: Resources,
    pub status: NodeStatus,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Node {
    pub fn region(&self) -> &str {
        &self.location.region
    }

    /// Resources not yet reserved.
    pub fn free(&self) -> Resources {
        self.capacity.remaining(&self.utilization)
    }

    /// Whether the unreserved part of this node satisfies `request`.
    pub fn can_fit(&self, request: &Resources) -> bool {
        self.free().covers(request)
    }
}

// ── Workload ──────────────────────────────────────────────────────

/// Optional placement constraints on a workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementConstraints {
    /// Maximum tolerable latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_latency_ms: Option<u32>,
    /// Data-residency: the only regions this workload may land in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_regions: Option<Vec<String>>,
    /// Providers this workload may use, in order of preference.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_providers: Vec<ProviderTag>,
}

/// A placement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub id: WorkloadId,
    pub resources: Resources,
    /// Ordered region preference; empty means no preference.
    #[serde(default)]
    pub preferred_regions: Vec<String>,
    /// Labels every candidate node must carry with equal values.
    #[serde(default)]
    pub required_labels: HashMap<String, String>,
    #[serde(default)]
    pub constraints: PlacementConstraints,
}

impl Workload {
    pub fn new(id: impl Into<String>, resources: Resources) -> Self {
        Self {
            id: id.into(),
            resources,
            preferred_regions: Vec::new(),
            required_labels: HashMap::new(),
            constraints: PlacementConstraints::default(),
        }
    }
}

// ── Results & reports ─────────────────────────────────────────────

/// A committed placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub workload_id: WorkloadId,
    /// Snapshot of the node right after the reservation committed.
    pub node: Node,
    pub score: f64,
    pub justification: String,
}

/// A region offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub provider: ProviderTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Advisory health of one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Summed resource quantities, with absent dimensions counted as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTotals {
    pub cpu_millis: u64,
    pub memory_mb: u64,
    pub storage_gb: u64,
    pub gpu: u64,
}

impl ResourceTotals {
    pub fn accumulate(&mut self, r: &Resources) {
        self.cpu_millis = self.cpu_millis.saturating_add(r.cpu_millis);
        self.memory_mb = self.memory_mb.saturating_add(r.memory_mb);
        self.storage_gb = self.storage_gb.saturating_add(r.storage_gb.unwrap_or(0));
        self.gpu = self.gpu.saturating_add(u64::from(r.gpu.unwrap_or(0)));
    }
}

/// Aggregate capacity and usage for one provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUtilization {
    pub nodes: usize,
    pub total: ResourceTotals,
    pub used: ResourceTotals,
}
