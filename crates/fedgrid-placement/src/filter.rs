//! Candidate filtering.
//!
//! Reduces "every known node" to "nodes that may legally host this
//! workload". Rules run in a fixed order and the first failure names the
//! rejection. Survivors keep their enumeration order; ranking is the
//! scorer's job.

use std::fmt;

use tracing::debug;

use fedgrid_core::{Node, NodeStatus, Workload};

/// Why a node can't host a workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Unavailable,
    InsufficientResources,
    ProviderNotPreferred,
    RegionNotPreferred,
    RegionNotAllowed,
    LabelMismatch { key: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Unavailable => f.write_str("node unavailable"),
            Rejection::InsufficientResources => f.write_str("insufficient free resources"),
            Rejection::ProviderNotPreferred => f.write_str("provider not in preference list"),
            Rejection::RegionNotPreferred => f.write_str("region not in preferred regions"),
            Rejection::RegionNotAllowed => f.write_str("region not allowed for data residency"),
            Rejection::LabelMismatch { key } => write!(f, "required label {key} missing or different"),
        }
    }
}

/// Check one node against every hard constraint of `workload`.
pub fn evaluate(node: &Node, workload: &Workload) -> Result<(), Rejection> {
    if node.status == NodeStatus::Unavailable {
        return Err(Rejection::Unavailable);
    }

    if !node.can_fit(&workload.resources) {
        return Err(Rejection::InsufficientResources);
    }

    let providers = &workload.constraints.preferred_providers;
    if !providers.is_empty() && !providers.contains(&node.provider) {
        return Err(Rejection::ProviderNotPreferred);
    }

    // Preferred regions are a hard filter. Callers wanting a soft
    // preference leave the list empty.
    if !workload.preferred_regions.is_empty()
        && !workload.preferred_regions.iter().any(|r| r == node.region())
    {
        return Err(Rejection::RegionNotPreferred);
    }

    if let Some(allowed) = &workload.constraints.allowed_regions {
        if !allowed.iter().any(|r| r == node.region()) {
            return Err(Rejection::RegionNotAllowed);
        }
    }

    for (key, value) in &workload.required_labels {
        match node.labels.get(key) {
            Some(v) if v == value => {}
            _ => return Err(Rejection::LabelMismatch { key: key.clone() }),
        }
    }

    Ok(())
}

/// Nodes from `nodes` that may host `workload`, in their original order.
pub fn filter_candidates<'a>(nodes: &'a [Node], workload: &Workload) -> Vec<&'a Node> {
    nodes
        .iter()
        .filter(|node| match evaluate(node, workload) {
            Ok(()) => true,
            Err(reason) => {
                debug!(
                    workload = %workload.id,
                    node = %node.id,
                    provider = %node.provider,
                    %reason,
                    "node filtered out"
                );
                false
            }
        })
        .collect()
}
