//! Adapter registry: provider identity → adapter.
//!
//! Adapters are kept in a `Vec` in registration order. Enumeration order
//! is what breaks scoring ties, so it has to be stable; re-registering a
//! provider swaps the adapter in place rather than moving it to the end.

use std::sync::Arc;

use tracing::{debug, info};

use fedgrid_core::ProviderTag;

use crate::adapter::BackendAdapter;

#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn BackendAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `adapter` under its provider identity. Last write wins.
    pub fn register(&mut self, adapter: Arc<dyn BackendAdapter>) {
        let provider = adapter.provider();
        match self.adapters.iter_mut().find(|a| a.provider() == provider) {
            Some(existing) => {
                *existing = adapter;
                debug!(%provider, "adapter replaced");
            }
            None => {
                self.adapters.push(adapter);
                info!(%provider, "adapter registered");
            }
        }
    }

    pub fn get(&self, provider: ProviderTag) -> Option<Arc<dyn BackendAdapter>> {
        self.adapters.iter().find(|a| a.provider() == provider).cloned()
    }

    /// All adapters in registration order.
    pub fn list_all(&self) -> Vec<Arc<dyn BackendAdapter>> {
        self.adapters.clone()
    }

    pub fn providers(&self) -> Vec<ProviderTag> {
        self.adapters.iter().map(|a| a.provider()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryAdapter;
    use fedgrid_core::{Location, Node, NodeStatus, Resources};
    use std::collections::HashMap;

    fn adapter_with(provider: ProviderTag, node_ids: &[&str]) -> Arc<dyn BackendAdapter> {
        let nodes = node_ids
            .iter()
            .map(|id| Node {
                id: id.to_string(),
                provider,
                location: Location::region("r"),
                capacity: Resources::new(1000, 1000),
                utilization: Resources::default(),
                status: NodeStatus::Available,
                labels: HashMap::new(),
            })
            .collect();
        Arc::new(InMemoryAdapter::new(provider, vec![], nodes))
    }

    #[test]
    fn starts_empty() {
        let registry = AdapterRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list_all().is_empty());
        assert!(registry.get(ProviderTag::Edge).is_none());
    }

    #[test]
    fn lists_in_registration_order() {
        let mut registry = AdapterRegistry::new();
        registry.register(adapter_with(ProviderTag::Edge, &[]));
        registry.register(adapter_with(ProviderTag::HyperscaleA, &[]));
        registry.register(adapter_with(ProviderTag::HyperscaleC, &[]));

        assert_eq!(
            registry.providers(),
            vec![ProviderTag::Edge, ProviderTag::HyperscaleA, ProviderTag::HyperscaleC]
        );
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_latest_in_place() {
        let mut registry = AdapterRegistry::new();
        registry.register(adapter_with(ProviderTag::HyperscaleA, &["old"]));
        registry.register(adapter_with(ProviderTag::Edge, &[]));
        registry.register(adapter_with(ProviderTag::HyperscaleA, &["new"]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.providers(), vec![ProviderTag::HyperscaleA, ProviderTag::Edge]);

        let a = registry.get(ProviderTag::HyperscaleA).unwrap();
        let nodes = a.list_nodes(None).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "new");
    }
}
