//! Node scoring for placement decisions.
//!
//! Evaluates filtered candidates using a weighted combination of:
//! - **Resource availability**: free share of the scarcest of CPU/memory after placement
//! - **Load balancing**: prefer nodes that stay lightly loaded after placement
//! - **Region match**: node sits in one of the workload's preferred regions
//! - **Provider match**: node's provider is one the workload prefers
//! - **Edge latency bonus**: latency-sensitive workloads on edge nodes
//!
//! The nominal weights sum to 1.0. The edge bonus is added on top, so a
//! score can reach `1.0 + edge_latency_bonus`.

use std::cmp::Ordering;

use serde::Serialize;

use fedgrid_core::config::{
    DEFAULT_EDGE_LATENCY_BONUS, DEFAULT_LOAD_WEIGHT, DEFAULT_PROVIDER_WEIGHT, DEFAULT_REGION_WEIGHT,
    DEFAULT_RESOURCE_WEIGHT, ScoringConfig,
};
use fedgrid_core::{Node, Workload, utilization_ratio};

pub const REGION_MATCH: &str = "preferred region";
pub const PROVIDER_MATCH: &str = "preferred provider";
pub const LOW_LATENCY_EDGE: &str = "low-latency edge";
pub const BEST_AVAILABLE: &str = "best available resources";

/// Weights for the scoring components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringWeights {
    pub resource: f64,
    pub load: f64,
    pub region: f64,
    pub provider: f64,
    /// Added (uncapped) for edge nodes when the workload's latency
    /// budget is below `low_latency_threshold_ms`.
    pub edge_latency_bonus: f64,
    pub low_latency_threshold_ms: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            resource: DEFAULT_RESOURCE_WEIGHT,
            load: DEFAULT_LOAD_WEIGHT,
            region: DEFAULT_REGION_WEIGHT,
            provider: DEFAULT_PROVIDER_WEIGHT,
            edge_latency_bonus: DEFAULT_EDGE_LATENCY_BONUS,
            low_latency_threshold_ms: 50,
        }
    }
}

impl ScoringWeights {
    /// Defaults with any fleet-file overrides applied. Bounds are
    /// enforced when the fleet file is loaded.
    pub fn from_config(config: Option<&ScoringConfig>) -> Self {
        let mut weights = Self::default();
        let Some(c) = config else { return weights };
        if let Some(v) = c.resource {
            weights.resource = v;
        }
        if let Some(v) = c.load {
            weights.load = v;
        }
        if let Some(v) = c.region {
            weights.region = v;
        }
        if let Some(v) = c.provider {
            weights.provider = v;
        }
        if let Some(v) = c.edge_latency_bonus {
            weights.edge_latency_bonus = v;
        }
        if let Some(v) = c.low_latency_threshold_ms {
            weights.low_latency_threshold_ms = v;
        }
        weights
    }
}

/// Individual score components for debugging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub resource: f64,
    pub load: f64,
    pub region: f64,
    pub provider: f64,
    pub latency: f64,
}

/// Score and justification for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeScore {
    pub score: f64,
    pub justification: String,
    pub breakdown: ScoreBreakdown,
}

/// A candidate paired with its score.
#[derive(Debug, Clone)]
pub struct ScoredNode<'a> {
    pub node: &'a Node,
    pub score: NodeScore,
}

/// Score a node that already passed the filter.
///
/// Ratios use projected utilization (current + this workload) so the
/// score reflects the node as it would look after placement.
pub fn score_node(node: &Node, workload: &Workload, weights: &ScoringWeights) -> NodeScore {
    let req = &workload.resources;
    let cpu_used = node.utilization.cpu_millis + req.cpu_millis;
    let mem_used = node.utilization.memory_mb + req.memory_mb;

    let cpu_util = utilization_ratio(cpu_used, node.capacity.cpu_millis).clamp(0.0, 1.0);
    let mem_util = utilization_ratio(mem_used, node.capacity.memory_mb).clamp(0.0, 1.0);

    // The scarcer dimension decides; a node starved on one axis is not
    // rescued by plenty on the other.
    let resource = (1.0 - cpu_util).min(1.0 - mem_util) * weights.resource;
    let load = (1.0 - cpu_util.max(mem_util)) * weights.load;

    let mut reasons = Vec::new();

    let region = if workload.preferred_regions.iter().any(|r| r == node.region()) {
        reasons.push(REGION_MATCH);
        weights.region
    } else {
        0.0
    };

    let provider = if workload.constraints.preferred_providers.contains(&node.provider) {
        reasons.push(PROVIDER_MATCH);
        weights.provider
    } else {
        0.0
    };

    let latency = match workload.constraints.max_latency_ms {
        Some(ms) if ms < weights.low_latency_threshold_ms && node.provider.is_edge() => {
            reasons.push(LOW_LATENCY_EDGE);
            weights.edge_latency_bonus
        }
        _ => 0.0,
    };

    let justification = if reasons.is_empty() {
        BEST_AVAILABLE.to_string()
    } else {
        reasons.join(", ")
    };

    NodeScore {
        score: resource + load + region + provider + latency,
        justification,
        breakdown: ScoreBreakdown {
            resource,
            load,
            region,
            provider,
            latency,
        },
    }
}

/// Score candidates and sort best first.
///
/// The sort is stable: equal scores keep filter order, which is adapter
/// registration order followed by each adapter's enumeration order.
pub fn rank_candidates<'a>(
    candidates: Vec<&'a Node>,
    workload: &Workload,
    weights: &ScoringWeights,
) -> Vec<ScoredNode<'a>> {
    let mut scored: Vec<ScoredNode<'a>> = candidates
        .into_iter()
        .map(|node| ScoredNode {
            node,
            score: score_node(node, workload, weights),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .score
            .partial_cmp(&a.score.score)
            .unwrap_or(Ordering::Equal)
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedgrid_core::{Location, NodeStatus, ProviderTag, Resources};
    use std::collections::HashMap;

    fn make_node(id: &str, provider: ProviderTag, region: &str, cpu: u64, mem: u64) -> Node {
        Node {
            id: id.to_string(),
            provider,
            location: Location::region(region),
            capacity: Resources::new(cpu, mem),
            utilization: Resources::default(),
            status: NodeStatus::Available,
            labels: HashMap::new(),
        }
    }

    fn req(cpu: u64, mem: u64) -> Workload {
        Workload::new("w1", Resources::new(cpu, mem))
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn half_free_node_scores_point_three_five() {
        let node = make_node("n1", ProviderTag::HyperscaleA, "us", 4000, 8000);
        let s = score_node(&node, &req(2000, 4000), &ScoringWeights::default());

        assert!(approx(s.breakdown.resource, 0.2), "resource = {}", s.breakdown.resource);
        assert!(approx(s.breakdown.load, 0.15), "load = {}", s.breakdown.load);
        assert!(approx(s.score, 0.35), "score = {}", s.score);
        assert_eq!(s.justification, BEST_AVAILABLE);
    }

    #[test]
    fn scarcest_dimension_drives_resource_score() {
        // CPU plentiful, memory nearly gone.
        let mut node = make_node("n1", ProviderTag::HyperscaleA, "us", 10_000, 1000);
        node.utilization = Resources::new(0, 800);
        let s = score_node(&node, &req(1000, 100), &ScoringWeights::default());

        // Memory after placement: 900/1000 → 0.1 free.
        assert!(approx(s.breakdown.resource, 0.1 * 0.4));
        assert!(approx(s.breakdown.load, 0.1 * 0.3));
    }

    #[test]
    fn less_loaded_node_scores_higher() {
        let mut loaded = make_node("n1", ProviderTag::HyperscaleA, "us", 4000, 4000);
        loaded.utilization = Resources::new(2000, 2000);
        let idle = make_node("n2", ProviderTag::HyperscaleA, "us", 4000, 4000);

        let w = req(500, 500);
        let weights = ScoringWeights::default();
        assert!(score_node(&idle, &w, &weights).score > score_node(&loaded, &w, &weights).score);
    }

    #[test]
    fn bonuses_fire_and_are_justified() {
        let node = make_node("e1", ProviderTag::Edge, "eu", 4000, 4000);
        let mut w = req(1000, 1000);
        w.preferred_regions = vec!["eu".to_string()];
        w.constraints.preferred_providers = vec![ProviderTag::Edge];
        w.constraints.max_latency_ms = Some(30);

        let s = score_node(&node, &w, &ScoringWeights::default());
        assert!(approx(s.breakdown.region, 0.2));
        assert!(approx(s.breakdown.provider, 0.1));
        assert!(approx(s.breakdown.latency, 0.1));
        assert_eq!(s.justification, "preferred region, preferred provider, low-latency edge");
    }

    #[test]
    fn latency_bonus_needs_edge_and_tight_budget() {
        let weights = ScoringWeights::default();
        let edge = make_node("e1", ProviderTag::Edge, "eu", 4000, 4000);
        let cloud = make_node("c1", ProviderTag::HyperscaleC, "eu", 4000, 4000);

        let mut w = req(1000, 1000);
        w.constraints.max_latency_ms = Some(50);
        assert!(approx(score_node(&edge, &w, &weights).breakdown.latency, 0.0));

        w.constraints.max_latency_ms = Some(49);
        assert!(approx(score_node(&edge, &w, &weights).breakdown.latency, 0.1));
        assert!(approx(score_node(&cloud, &w, &weights).breakdown.latency, 0.0));
    }

    #[test]
    fn score_stays_within_bounds() {
        let weights = ScoringWeights::default();
        let upper = 1.0 + weights.edge_latency_bonus;
        for provider in ProviderTag::ALL {
            for used in [0u64, 1000, 2500, 3999] {
                let mut node = make_node("n", provider, "eu", 4000, 4000);
                node.utilization = Resources::new(used, used / 2);
                let mut w = req(1, 1);
                w.preferred_regions = vec!["eu".to_string()];
                w.constraints.preferred_providers = vec![provider];
                w.constraints.max_latency_ms = Some(10);

                let s = score_node(&node, &w, &weights).score;
                assert!((0.0..=upper + 1e-9).contains(&s), "score {s} out of range");
            }
        }
    }

    #[test]
    fn zero_capacity_dimension_scores_as_full() {
        let node = make_node("n1", ProviderTag::Edge, "eu", 1000, 0);
        let s = score_node(&node, &req(100, 0), &ScoringWeights::default());
        assert!(approx(s.breakdown.resource, 0.0));
        assert!(approx(s.breakdown.load, 0.0));
    }

    #[test]
    fn rank_sorts_descending() {
        let mut n1 = make_node("n1", ProviderTag::HyperscaleA, "us", 4000, 4000);
        n1.utilization = Resources::new(3000, 3000);
        let n2 = make_node("n2", ProviderTag::HyperscaleA, "us", 4000, 4000);
        let mut n3 = make_node("n3", ProviderTag::HyperscaleA, "us", 4000, 4000);
        n3.utilization = Resources::new(1500, 1500);

        let ranked = rank_candidates(vec![&n1, &n2, &n3], &req(100, 100), &ScoringWeights::default());
        let ids: Vec<&str> = ranked.iter().map(|s| s.node.id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n3", "n1"]);
    }

    #[test]
    fn ties_keep_filter_order() {
        let a = make_node("a", ProviderTag::HyperscaleB, "us", 4000, 4000);
        let b = make_node("b", ProviderTag::HyperscaleA, "us", 4000, 4000);
        let c = make_node("c", ProviderTag::HyperscaleC, "us", 4000, 4000);

        let w = req(1000, 1000);
        let weights = ScoringWeights::default();
        for _ in 0..5 {
            let ranked = rank_candidates(vec![&a, &b, &c], &w, &weights);
            let ids: Vec<&str> = ranked.iter().map(|s| s.node.id.as_str()).collect();
            assert_eq!(ids, vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn weights_take_config_overrides() {
        let config = ScoringConfig {
            region: Some(0.5),
            low_latency_threshold_ms: Some(100),
            ..Default::default()
        };
        let weights = ScoringWeights::from_config(Some(&config));
        assert_eq!(weights.region, 0.5);
        assert_eq!(weights.low_latency_threshold_ms, 100);
        assert_eq!(weights.resource, 0.4);
        assert_eq!(ScoringWeights::from_config(None), ScoringWeights::default());
    }
}
