//! Scheduler: places workloads on nodes across every registered provider.
//!
//! `schedule_placement` runs: enumerate → filter → score → ranked
//! reservation walk. The walk stops at the first adapter that commits.
//! If every candidate refuses (usually a lost race with a concurrent
//! caller) the answer is "no placement"; the scheduler does not
//! re-filter or retry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use fedgrid_adapter::{AdapterRegistry, BackendAdapter, Reservation, adapters_from_config};
use fedgrid_core::{
    AdapterHealth, FleetConfig, Node, PlacementResult, ProviderTag, ProviderUtilization, Region,
    Workload,
};
use fedgrid_placement::{ScoringWeights, filter_candidates, rank_candidates};

use crate::batch::geo_shards;
use crate::error::{SchedulerError, SchedulerResult};

/// Optional restrictions for [`Scheduler::list_all_nodes`].
#[derive(Debug, Clone, Default)]
pub struct NodeQuery {
    pub provider: Option<ProviderTag>,
    pub region: Option<String>,
}

/// The federated scheduler.
///
/// Holds only the adapter registry and scoring weights. Share it behind
/// an `Arc` to schedule from many tasks at once.
pub struct Scheduler {
    registry: RwLock<AdapterRegistry>,
    weights: ScoringWeights,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with default scoring weights and no adapters.
    pub fn new() -> Self {
        Self::with_weights(ScoringWeights::default())
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self {
            registry: RwLock::new(AdapterRegistry::new()),
            weights,
        }
    }

    /// Build a scheduler from a fleet file: its scoring overrides plus
    /// one in-memory adapter per declared provider, in file order.
    pub async fn from_fleet(config: &FleetConfig) -> Self {
        let scheduler = Self::with_weights(ScoringWeights::from_config(config.scoring.as_ref()));
        for adapter in adapters_from_config(config) {
            scheduler.register_adapter(adapter).await;
        }
        scheduler
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Register an adapter, replacing any previous one for its provider.
    pub async fn register_adapter(&self, adapter: Arc<dyn BackendAdapter>) {
        self.registry.write().await.register(adapter);
    }

    /// Registered providers in registration order.
    pub async fn providers(&self) -> Vec<ProviderTag> {
        self.registry.read().await.providers()
    }

    /// Copy the adapter list so no lock is held across adapter calls.
    async fn adapters(&self) -> Vec<Arc<dyn BackendAdapter>> {
        self.registry.read().await.list_all()
    }

    /// Place one workload.
    ///
    /// Returns `Ok(None)` when no node is eligible or every reservation
    /// attempt was refused. Adapter call failures propagate.
    pub async fn schedule_placement(&self, workload: &Workload) -> SchedulerResult<Option<PlacementResult>> {
        let adapters = self.adapters().await;

        // `owners[i]` is the index into `adapters` that listed `nodes[i]`.
        let mut nodes = Vec::new();
        let mut owners = Vec::new();
        for (index, adapter) in adapters.iter().enumerate() {
            let provider = adapter.provider();
            let listed = adapter
                .list_nodes(None)
                .await
                .map_err(SchedulerError::adapter(provider))?;
            owners.extend(std::iter::repeat_n(index, listed.len()));
            nodes.extend(listed);
        }

        let candidates = filter_candidates(&nodes, workload);
        if candidates.is_empty() {
            debug!(workload = %workload.id, nodes = nodes.len(), "no eligible nodes");
            return Ok(None);
        }

        let ranked = rank_candidates(candidates, workload, &self.weights);
        let attempts = ranked.len();

        for candidate in ranked {
            let node = candidate.node;
            let Some(owner) = nodes.iter().position(|n| std::ptr::eq(n, node)) else {
                continue;
            };
            let adapter = &adapters[owners[owner]];

            let outcome = adapter
                .reserve(&node.id, workload)
                .await
                .map_err(SchedulerError::adapter(adapter.provider()))?;

            match outcome {
                Reservation::Reserved(snapshot) => {
                    info!(
                        workload = %workload.id,
                        node = %snapshot.id,
                        provider = %snapshot.provider,
                        region = %snapshot.region(),
                        score = candidate.score.score,
                        "workload placed"
                    );
                    return Ok(Some(PlacementResult {
                        workload_id: workload.id.clone(),
                        node: snapshot,
                        score: candidate.score.score,
                        justification: candidate.score.justification,
                    }));
                }
                Reservation::Rejected(reason) => {
                    debug!(
                        workload = %workload.id,
                        node = %node.id,
                        provider = %node.provider,
                        ?reason,
                        "reservation refused, trying next candidate"
                    );
                }
            }
        }

        warn!(workload = %workload.id, attempts, "every candidate refused the reservation");
        Ok(None)
    }

    /// Place a batch, sharded by primary preferred region.
    ///
    /// Workloads are scheduled one at a time. Ones that can't be placed
    /// are left out of the result; diff ids against the input to find
    /// them. An adapter failure aborts the batch, and placements already
    /// committed stay committed.
    pub async fn schedule_batch(&self, workloads: &[Workload]) -> SchedulerResult<Vec<PlacementResult>> {
        let shards = geo_shards(workloads);
        let mut results = Vec::with_capacity(workloads.len());

        for shard in shards {
            debug!(shard = %shard.key, workloads = shard.workloads.len(), "scheduling geo-shard");
            for workload in shard.workloads {
                if let Some(result) = self.schedule_placement(workload).await? {
                    results.push(result);
                }
            }
        }

        info!(requested = workloads.len(), placed = results.len(), "batch scheduled");
        Ok(results)
    }

    /// Summed capacity and usage per provider, recomputed on every call.
    pub async fn utilization_by_provider(&self) -> SchedulerResult<BTreeMap<ProviderTag, ProviderUtilization>> {
        let mut report = BTreeMap::new();
        for adapter in self.adapters().await {
            let provider = adapter.provider();
            let nodes = adapter
                .list_nodes(None)
                .await
                .map_err(SchedulerError::adapter(provider))?;

            let mut entry = ProviderUtilization::default();
            for node in &nodes {
                entry.nodes += 1;
                entry.total.accumulate(&node.capacity);
                entry.used.accumulate(&node.utilization);
            }
            report.insert(provider, entry);
        }
        Ok(report)
    }

    /// Nodes across adapters, optionally limited to one provider and/or region.
    pub async fn list_all_nodes(&self, query: &NodeQuery) -> SchedulerResult<Vec<Node>> {
        let mut nodes = Vec::new();
        for adapter in self.adapters().await {
            let provider = adapter.provider();
            if query.provider.is_some_and(|p| p != provider) {
                continue;
            }
            let listed = adapter
                .list_nodes(query.region.as_deref())
                .await
                .map_err(SchedulerError::adapter(provider))?;
            nodes.extend(listed);
        }
        Ok(nodes)
    }

    /// Regions offered by every adapter, in registration order.
    pub async fn list_regions(&self) -> SchedulerResult<Vec<Region>> {
        let mut regions = Vec::new();
        for adapter in self.adapters().await {
            let provider = adapter.provider();
            regions.extend(
                adapter
                    .list_regions()
                    .await
                    .map_err(SchedulerError::adapter(provider))?,
            );
        }
        Ok(regions)
    }

    /// Advisory health roll-up. A failed probe reads as unhealthy.
    pub async fn health_by_provider(&self) -> BTreeMap<ProviderTag, AdapterHealth> {
        let mut report = BTreeMap::new();
        for adapter in self.adapters().await {
            let provider = adapter.provider();
            let health = match adapter.health_check().await {
                Ok(h) => h,
                Err(error) => {
                    warn!(%provider, %error, "health check failed");
                    AdapterHealth::Unhealthy
                }
            };
            report.insert(provider, health);
        }
        report
    }

    /// Undo a placement by releasing its reservation on the owning adapter.
    ///
    /// Returns `false` if the provider is no longer registered or the
    /// adapter had nothing to release.
    pub async fn release_placement(&self, placement: &PlacementResult) -> SchedulerResult<bool> {
        let provider = placement.node.provider;
        let Some(adapter) = self.registry.read().await.get(provider) else {
            warn!(%provider, workload = %placement.workload_id, "release for unregistered provider");
            return Ok(false);
        };
        let released = adapter
            .release(&placement.node.id, &placement.workload_id)
            .await
            .map_err(SchedulerError::adapter(provider))?;
        if released {
            info!(workload = %placement.workload_id, node = %placement.node.id, %provider, "placement released");
        }
        Ok(released)
    }
}
