//! On-disk snapshot document.
//!
//! One JSON file per refresh, the contract between the aggregation core and
//! anything that renders it. Display order is not taken from the file: load
//! re-derives it from the canonical key list, ignores unknown keys and fills
//! missing ones with zero so older files still produce the full tree shape.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{RowLevel, SupplyTree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub value: f64,
    #[serde(rename = "type")]
    pub row_type: RowLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expandable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub data: BTreeMap<String, SnapshotEntry>,
    pub total_supply: f64,
    /// RFC 3339 timestamp of the refresh that produced this snapshot.
    pub last_updated: String,
    /// Epoch milliseconds, used for staleness checks.
    pub fetched_at: u64,
}

impl Snapshot {
    pub fn from_tree(
        tree: &SupplyTree,
        total_supply: f64,
        last_updated: String,
        fetched_at: u64,
    ) -> Self {
        let data = tree
            .iter()
            .map(|node| {
                (
                    node.key.clone(),
                    SnapshotEntry {
                        value: node.value,
                        row_type: node.level,
                        parent: node.parent.clone(),
                        expandable: node.expandable,
                    },
                )
            })
            .collect();
        Self {
            data,
            total_supply,
            last_updated,
            fetched_at,
        }
    }

    /// Rebuild the tree from stored values. Structure (levels, parents,
    /// expandability) comes from the canonical shape, not the file.
    pub fn to_tree(&self) -> SupplyTree {
        let values: HashMap<String, f64> = self
            .data
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value))
            .collect();
        SupplyTree::from_values(&values)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot = serde_json::from_str(&body)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
        Ok(snapshot)
    }

    pub fn age_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.fetched_at) / 1000
    }

    pub fn is_stale(&self, now_ms: u64, max_age_secs: u64) -> bool {
        self.age_secs(now_ms) > max_age_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::CANONICAL_KEYS;

    fn sample_tree() -> SupplyTree {
        let mut values = HashMap::new();
        values.insert("total".to_string(), 537_308_290.0);
        values.insert("liquid".to_string(), 244_946_282.0);
        values.insert("staked".to_string(), 231_787_257.0);
        values.insert("staked.unlocking".to_string(), 5.0);
        values.insert("staked.unlocking.0-1 years".to_string(), 5.0);
        values.insert("staked.locked".to_string(), 7.0);
        values.insert("staked.locked.8+ years".to_string(), 7.0);
        values.insert("burned".to_string(), 10.0);
        values.insert("burned.fees".to_string(), 4.0);
        values.insert("burned.cycles".to_string(), 6.0);
        SupplyTree::from_values(&values)
    }

    #[test]
    fn test_round_trip_preserves_values_and_structure() {
        let tree = sample_tree();
        let snapshot = Snapshot::from_tree(
            &tree,
            537_308_290.0,
            "2024-09-20T12:00:00.000Z".to_string(),
            1_726_833_600_000,
        );
        let rebuilt = snapshot.to_tree();
        assert_eq!(rebuilt.len(), tree.len());
        for (a, b) in tree.iter().zip(rebuilt.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let tree = sample_tree();
        let snapshot =
            Snapshot::from_tree(&tree, 537_308_290.0, "2024-09-20T12:00:00.000Z".into(), 42);
        let body = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.total_supply, snapshot.total_supply);
        assert_eq!(parsed.fetched_at, 42);
        assert_eq!(parsed.data, snapshot.data);
        // Wire field names stay camelCase and the row types keep their tags.
        assert!(body.contains("\"totalSupply\""));
        assert!(body.contains("\"lastUpdated\""));
        assert!(body.contains("\"fetchedAt\""));
        assert!(body.contains("\"row-level-0\""));
    }

    #[test]
    fn test_expandable_serialized_only_when_true() {
        let tree = sample_tree();
        let snapshot = Snapshot::from_tree(&tree, 0.0, String::new(), 0);
        let value = serde_json::to_value(&snapshot).unwrap();
        let staked = &value["data"]["staked"];
        let liquid = &value["data"]["liquid"];
        assert_eq!(staked["expandable"], serde_json::json!(true));
        assert!(liquid.get("expandable").is_none());
        assert!(liquid.get("parent").is_none());
        assert_eq!(value["data"]["burned.fees"]["parent"], "burned");
    }

    #[test]
    fn test_partial_file_loads_full_shape() {
        let body = r#"{
            "data": {
                "total": { "value": 100.0, "type": "row-level-0" },
                "not.a.real.key": { "value": 5.0, "type": "row-level-2" }
            },
            "totalSupply": 100.0,
            "lastUpdated": "2024-09-20T12:00:00.000Z",
            "fetchedAt": 0
        }"#;
        let snapshot: Snapshot = serde_json::from_str(body).unwrap();
        let tree = snapshot.to_tree();
        assert_eq!(tree.len(), CANONICAL_KEYS.len());
        assert_eq!(tree.get("total").unwrap().value, 100.0);
        assert_eq!(tree.get("staked").unwrap().value, 0.0);
        assert!(tree.get("not.a.real.key").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let snapshot = Snapshot::from_tree(&sample_tree(), 537_308_290.0, "x".into(), 7);
        snapshot.save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.total_supply, snapshot.total_supply);
        assert_eq!(loaded.data, snapshot.data);
    }

    #[test]
    fn test_staleness() {
        let snapshot = Snapshot::from_tree(&sample_tree(), 0.0, String::new(), 1_000_000);
        assert!(!snapshot.is_stale(1_000_000 + 3_600_000, 3600));
        assert!(snapshot.is_stale(1_000_000 + 3_600_001 + 1000, 3600));
    }
}
