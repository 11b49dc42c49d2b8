//! Geo-sharding for batch scheduling.
//!
//! Workloads are grouped by the first entry of their preferred-regions
//! list. Shards come out in first-appearance order and keep input order
//! inside each shard.

use fedgrid_core::Workload;

/// Shard key for workloads without a preferred region.
pub const DEFAULT_SHARD: &str = "default";

#[derive(Debug)]
pub struct GeoShard<'a> {
    pub key: String,
    pub workloads: Vec<&'a Workload>,
}

pub fn shard_key(workload: &Workload) -> &str {
    workload
        .preferred_regions
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_SHARD)
}

/// Partition `workloads` by primary preferred region.
pub fn geo_shards(workloads: &[Workload]) -> Vec<GeoShard<'_>> {
    let mut shards: Vec<GeoShard<'_>> = Vec::new();
    for workload in workloads {
        let key = shard_key(workload);
        match shards.iter_mut().find(|s| s.key == key) {
            Some(shard) => shard.workloads.push(workload),
            None => shards.push(GeoShard {
                key: key.to_string(),
                workloads: vec![workload],
            }),
        }
    }
    shards
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedgrid_core::Resources;

    fn w(id: &str, regions: &[&str]) -> Workload {
        let mut w = Workload::new(id, Resources::new(1, 1));
        w.preferred_regions = regions.iter().map(|r| r.to_string()).collect();
        w
    }

    #[test]
    fn groups_by_first_preferred_region() {
        let workloads = vec![
            w("w1", &["us", "eu"]),
            w("w2", &["eu"]),
            w("w3", &[]),
            w("w4", &["us"]),
            w("w5", &[]),
        ];
        let shards = geo_shards(&workloads);

        let keys: Vec<&str> = shards.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["us", "eu", DEFAULT_SHARD]);

        let us: Vec<&str> = shards[0].workloads.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(us, vec!["w1", "w4"]);
        let default: Vec<&str> = shards[2].workloads.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(default, vec!["w3", "w5"]);
    }

    #[test]
    fn empty_batch_has_no_shards() {
        assert!(geo_shards(&[]).is_empty());
    }
}
