//! Supply tree data model.
//!
//! The tree is an ordered collection of nodes keyed by dotted path, rebuilt
//! wholesale on every refresh and immutable afterwards. Parent/child relations
//! are resolved through indexes built once at construction, never by splitting
//! key strings at query time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::MetricsError;
use crate::keys::{self, CANONICAL_KEYS};

/// Display depth of a row, serialized with the snapshot wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowLevel {
    #[serde(rename = "row-level-0")]
    Root,
    #[serde(rename = "row-level-1")]
    Category,
    #[serde(rename = "row-level-2")]
    Bucket,
}

impl RowLevel {
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => RowLevel::Root,
            1 => RowLevel::Category,
            _ => RowLevel::Bucket,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricNode {
    pub key: String,
    /// Whole-token amount (raw e8s already scaled down).
    pub value: f64,
    pub level: RowLevel,
    /// Key of the parent node; resolved by map lookup, not object edges.
    pub parent: Option<String>,
    pub expandable: bool,
}

/// Categories whose children are all modeled, so the parent value must equal
/// the child sum. Categories with unmodeled components (community funds, the
/// staked/rewards roots) are exempt until those sources exist.
const SUM_CHECKED: [&str; 6] = [
    "staked.unlocking",
    "staked.locked",
    "rewards.unlocking",
    "rewards.locked",
    "rewards.allocation",
    "burned",
];

const SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct SupplyTree {
    nodes: Vec<MetricNode>,
    by_key: HashMap<String, usize>,
    children: HashMap<String, Vec<String>>,
}

impl SupplyTree {
    /// Build the full canonical shape from a key→value map. Keys absent from
    /// the map get a zero placeholder so the tree shape is identical across
    /// snapshots; keys outside the canonical set are ignored.
    pub fn from_values(values: &HashMap<String, f64>) -> Self {
        let mut nodes = Vec::with_capacity(CANONICAL_KEYS.len());
        let mut by_key = HashMap::with_capacity(CANONICAL_KEYS.len());
        let mut children: HashMap<String, Vec<String>> = HashMap::new();

        for key in CANONICAL_KEYS {
            let parent = keys::parent_key(key).map(str::to_string);
            if let Some(ref p) = parent {
                children
                    .entry(p.clone())
                    .or_default()
                    .push(key.to_string());
            }
            by_key.insert(key.to_string(), nodes.len());
            nodes.push(MetricNode {
                key: key.to_string(),
                value: values.get(key).copied().unwrap_or(0.0),
                level: RowLevel::from_depth(keys::depth(key)),
                parent,
                expandable: keys::has_canonical_children(key),
            });
        }

        Self {
            nodes,
            by_key,
            children,
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetricNode> {
        self.by_key.get(key).map(|idx| &self.nodes[*idx])
    }

    pub fn parent_of(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|n| n.parent.as_deref())
    }

    pub fn children_of(&self, key: &str) -> &[String] {
        self.children.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes in canonical display order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Structural self-check run before a tree is published. A failure here is
    /// a data-integrity bug; propagating the tree would render nonsense
    /// rollups, so callers must abort the refresh instead.
    pub fn verify(&self) -> Result<(), MetricsError> {
        for node in &self.nodes {
            if !node.value.is_finite() || node.value < -1e-9 {
                return Err(MetricsError::TreeInvariantViolation(format!(
                    "{} has invalid value {}",
                    node.key, node.value
                )));
            }
            if let Some(parent) = &node.parent {
                if !self.by_key.contains_key(parent) {
                    return Err(MetricsError::TreeInvariantViolation(format!(
                        "{} references missing parent {}",
                        node.key, parent
                    )));
                }
            }
            let has_children = !self.children_of(&node.key).is_empty();
            if node.expandable != has_children {
                return Err(MetricsError::TreeInvariantViolation(format!(
                    "{} expandable={} but has_children={}",
                    node.key, node.expandable, has_children
                )));
            }
        }

        for key in SUM_CHECKED {
            let parent_value = match self.get(key) {
                Some(node) => node.value,
                None => {
                    return Err(MetricsError::TreeInvariantViolation(format!(
                        "sum-checked category {} missing",
                        key
                    )))
                }
            };
            let child_sum: f64 = self
                .children_of(key)
                .iter()
                .filter_map(|child| self.get(child))
                .map(|n| n.value)
                .sum();
            if !approx_eq(parent_value, child_sum) {
                return Err(MetricsError::TreeInvariantViolation(format!(
                    "{} = {} but children sum to {}",
                    key, parent_value, child_sum
                )));
            }
        }

        Ok(())
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= SUM_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}
