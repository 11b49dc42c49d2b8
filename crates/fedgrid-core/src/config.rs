//! Fleet file parser.
//!
//! A fleet file declares which provider adapters exist, the regions they
//! offer, the nodes they start with, and optional scoring overrides.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::types::ProviderTag;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    pub scoring: Option<ScoringConfig>,
    #[serde(default)]
    pub adapters: Vec<AdapterConfig>,
}

/// Overrides for the placement scorer. Omitted fields keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub resource: Option<f64>,
    pub load: Option<f64>,
    pub region: Option<f64>,
    pub provider: Option<f64>,
    pub edge_latency_bonus: Option<f64>,
    pub low_latency_threshold_ms: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub provider: ProviderTag,
    pub busy_threshold: Option<f64>,
    pub healthy: Option<bool>,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub id: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub region: String,
    pub cpu_millis: u64,
    pub memory_mb: u64,
    pub storage_gb: Option<u64>,
    pub gpu: Option<u32>,
    pub online: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fleet file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: FleetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject fleets the adapters could not represent unambiguously.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut providers = HashSet::new();
        for adapter in &self.adapters {
            if !providers.insert(adapter.provider) {
                bail!("provider {} declared more than once", adapter.provider);
            }

            let declared: HashSet<&str> = adapter.regions.iter().map(|r| r.id.as_str()).collect();
            let mut node_ids = HashSet::new();
            for node in &adapter.nodes {
                if !node_ids.insert(node.id.as_str()) {
                    bail!("duplicate node id {} in provider {}", node.id, adapter.provider);
                }
                if !declared.is_empty() && !declared.contains(node.region.as_str()) {
                    bail!(
                        "node {} is in region {} which provider {} does not declare",
                        node.id,
                        node.region,
                        adapter.provider
                    );
                }
            }

            if let Some(t) = adapter.busy_threshold {
                if !(0.0..=1.0).contains(&t) {
                    bail!("busy_threshold for {} must be within 0..=1, got {t}", adapter.provider);
                }
            }
        }

        if let Some(scoring) = &self.scoring {
            scoring.validate()?;
        }
        Ok(())
    }
}

/// Weights used when a `[scoring]` field is omitted.
pub const DEFAULT_RESOURCE_WEIGHT: f64 = 0.4;
pub const DEFAULT_LOAD_WEIGHT: f64 = 0.3;
pub const DEFAULT_REGION_WEIGHT: f64 = 0.2;
pub const DEFAULT_PROVIDER_WEIGHT: f64 = 0.1;
pub const DEFAULT_EDGE_LATENCY_BONUS: f64 = 0.1;

/// Largest edge bonus a fleet may configure. With component weights
/// summing to at most 1.0, scores stay within `0..=1.1`.
pub const MAX_EDGE_LATENCY_BONUS: f64 = 0.1;

impl ScoringConfig {
    /// Check the overrides merged over the defaults keep scores bounded.
    pub fn validate(&self) -> anyhow::Result<()> {
        let weights = [
            ("resource", self.resource.unwrap_or(DEFAULT_RESOURCE_WEIGHT)),
            ("load", self.load.unwrap_or(DEFAULT_LOAD_WEIGHT)),
            ("region", self.region.unwrap_or(DEFAULT_REGION_WEIGHT)),
            ("provider", self.provider.unwrap_or(DEFAULT_PROVIDER_WEIGHT)),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                bail!("scoring weight {name} must be a non-negative number, got {w}");
            }
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        // Tolerate float noise from sums like 0.1 + 0.2.
        if sum > 1.0 + 1e-9 {
            bail!("scoring weights must sum to at most 1.0, got {sum}");
        }

        let bonus = self.edge_latency_bonus.unwrap_or(DEFAULT_EDGE_LATENCY_BONUS);
        if !(0.0..=MAX_EDGE_LATENCY_BONUS).contains(&bonus) {
            bail!("edge_latency_bonus must be within 0..={MAX_EDGE_LATENCY_BONUS}, got {bonus}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FLEET: &str = r#"
[scoring]
region = 0.15

[[adapters]]
provider = "hyperscale-a"

[[adapters.regions]]
id = "us-east-1"
name = "US East"

[[adapters.nodes]]
id = "a-1"
region = "us-east-1"
cpu_millis = 4000
memory_mb = 8000
labels = { latency = "low" }

[[adapters]]
provider = "edge"
busy_threshold = 0.9

[[adapters.nodes]]
id = "e-1"
region = "edge-fra"
cpu_millis = 1000
memory_mb = 2048
gpu = 1
"#;

    #[test]
    fn parses_fleet() {
        let config = FleetConfig::from_toml_str(FLEET).unwrap();
        assert_eq!(config.adapters.len(), 2);
        assert_eq!(config.adapters[0].provider, ProviderTag::HyperscaleA);
        assert_eq!(config.adapters[0].nodes[0].labels["latency"], "low");
        assert_eq!(config.adapters[1].nodes[0].gpu, Some(1));
        assert_eq!(config.scoring.unwrap().region, Some(0.15));
    }

    #[test]
    fn parse_empty_fleet() {
        let config = FleetConfig::from_toml_str("").unwrap();
        assert!(config.adapters.is_empty());
        assert!(config.scoring.is_none());
    }

    #[test]
    fn rejects_duplicate_provider() {
        let toml_str = r#"
[[adapters]]
provider = "edge"
[[adapters]]
provider = "edge"
"#;
        let err = FleetConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_undeclared_region() {
        let toml_str = r#"
[[adapters]]
provider = "hyperscale-c"
[[adapters.regions]]
id = "eu-west-1"
[[adapters.nodes]]
id = "c-1"
region = "ap-south-1"
cpu_millis = 1
memory_mb = 1
"#;
        let err = FleetConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("does not declare"));
    }

    #[test]
    fn rejects_duplicate_node_id() {
        let toml_str = r#"
[[adapters]]
provider = "hyperscale-b"
[[adapters.nodes]]
id = "b-1"
region = "eu"
cpu_millis = 1
memory_mb = 1
[[adapters.nodes]]
id = "b-1"
region = "eu"
cpu_millis = 1
memory_mb = 1
"#;
        assert!(FleetConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn rejects_out_of_range_scoring() {
        let toml_str = r#"
[scoring]
region = 5.0
resource = -1.0
"#;
        let err = FleetConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("non-negative"));

        // Each weight in range, but together over budget with the defaults.
        let err = FleetConfig::from_toml_str("[scoring]\nregion = 0.5\n").unwrap_err();
        assert!(err.to_string().contains("at most 1.0"));

        let err = FleetConfig::from_toml_str("[scoring]\nedge_latency_bonus = 0.5\n").unwrap_err();
        assert!(err.to_string().contains("edge_latency_bonus"));
    }

    #[test]
    fn accepts_rebalanced_scoring() {
        let toml_str = r#"
[scoring]
resource = 0.5
load = 0.2
region = 0.2
provider = 0.1
edge_latency_bonus = 0.05
"#;
        let config = FleetConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.scoring.unwrap().resource, Some(0.5));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FLEET.as_bytes()).unwrap();

        let config = FleetConfig::from_file(file.path()).unwrap();
        assert_eq!(config.adapters.len(), 2);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = FleetConfig::from_toml_str(FLEET).unwrap();
        let rendered = config.to_toml_string().unwrap();
        let reparsed = FleetConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed.adapters[1].nodes[0].id, "e-1");
    }
}
