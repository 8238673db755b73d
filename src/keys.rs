//! Canonical key set for the supply breakdown.
//!
//! Every row the dashboard can ever display is named here, in display order.
//! Builders and renderers treat this list as authoritative: a key outside it
//! does not exist, and the order below is the only display order.

/// Ordered list of every valid dotted key. Index = display position.
pub const CANONICAL_KEYS: [&str; 53] = [
    "total",
    "liquid",
    "staked",
    "staked.unlocking",
    "staked.unlocking.0-1 years",
    "staked.unlocking.1-2 years",
    "staked.unlocking.2-3 years",
    "staked.unlocking.3-4 years",
    "staked.unlocking.4-5 years",
    "staked.unlocking.5-6 years",
    "staked.unlocking.6-7 years",
    "staked.unlocking.7-8 years",
    "staked.unlocking.8+ years",
    "staked.locked",
    "staked.locked.0-1 years",
    "staked.locked.1-2 years",
    "staked.locked.2-3 years",
    "staked.locked.3-4 years",
    "staked.locked.4-5 years",
    "staked.locked.5-6 years",
    "staked.locked.6-7 years",
    "staked.locked.7-8 years",
    "staked.locked.8+ years",
    "staked.community",
    "rewards",
    "rewards.unlocked",
    "rewards.unlocking",
    "rewards.unlocking.0-1 years",
    "rewards.unlocking.1-2 years",
    "rewards.unlocking.2-3 years",
    "rewards.unlocking.3-4 years",
    "rewards.unlocking.4-5 years",
    "rewards.unlocking.5-6 years",
    "rewards.unlocking.6-7 years",
    "rewards.unlocking.7-8 years",
    "rewards.unlocking.8+ years",
    "rewards.locked",
    "rewards.locked.0-1 years",
    "rewards.locked.1-2 years",
    "rewards.locked.2-3 years",
    "rewards.locked.3-4 years",
    "rewards.locked.4-5 years",
    "rewards.locked.5-6 years",
    "rewards.locked.6-7 years",
    "rewards.locked.7-8 years",
    "rewards.locked.8+ years",
    "rewards.allocation",
    "rewards.allocation.stakers",
    "rewards.allocation.nodes",
    "rewards.community",
    "burned",
    "burned.fees",
    "burned.cycles",
];

/// Rows expanded when a fresh view starts up: the three expandable roots.
pub const DEFAULT_EXPANDED: [&str; 3] = ["staked", "rewards", "burned"];

/// Parent key of a dotted key: everything before the last dot.
pub fn parent_key(key: &str) -> Option<&str> {
    key.rfind('.').map(|idx| &key[..idx])
}

/// Nesting depth: 0 for roots, 1 for subcategories, 2 for leaf buckets.
pub fn depth(key: &str) -> usize {
    key.matches('.').count()
}

pub fn is_canonical(key: &str) -> bool {
    CANONICAL_KEYS.contains(&key)
}

/// True when at least one canonical key nests directly or indirectly under `key`.
pub fn has_canonical_children(key: &str) -> bool {
    CANONICAL_KEYS
        .iter()
        .any(|k| k.len() > key.len() && k.starts_with(key) && k.as_bytes()[key.len()] == b'.')
}

/// Human-readable row label. Nested rows carry arrow prefixes so the table
/// reads as an indented hierarchy without cell padding.
pub fn display_name(key: &str) -> String {
    let fixed = match key {
        "total" => Some("Total"),
        "liquid" => Some("Liquid"),
        "staked" => Some("Staked"),
        "staked.unlocking" | "rewards.unlocking" => Some("→ Unlocking"),
        "staked.locked" | "rewards.locked" => Some("→ Locked"),
        "staked.community" | "rewards.community" => Some("→ Community"),
        "rewards" => Some("Rewards"),
        "rewards.unlocked" => Some("→ Unlocked"),
        "rewards.allocation" => Some("→ Allocation"),
        "rewards.allocation.stakers" => Some("→ → Stakers"),
        "rewards.allocation.nodes" => Some("→ → Nodes"),
        "burned" => Some("Burned"),
        "burned.fees" => Some("→ Fees"),
        "burned.cycles" => Some("→ Cycles"),
        _ => None,
    };
    if let Some(name) = fixed {
        return name.to_string();
    }
    // Year-range buckets display their last segment under the parent.
    if let Some(range) = key.rsplit('.').next() {
        if range.ends_with("years") {
            return match depth(key) {
                2 => format!("→ → {}", range),
                _ => range.to_string(),
            };
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_count_is_stable() {
        assert_eq!(CANONICAL_KEYS.len(), 53);
    }

    #[test]
    fn test_keys_are_unique() {
        let unique: std::collections::HashSet<_> = CANONICAL_KEYS.iter().collect();
        assert_eq!(unique.len(), CANONICAL_KEYS.len());
    }

    #[test]
    fn test_parents_are_canonical() {
        for key in CANONICAL_KEYS {
            if let Some(parent) = parent_key(key) {
                assert!(is_canonical(parent), "parent of {} missing: {}", key, parent);
            }
        }
    }

    #[test]
    fn test_parent_key_derivation() {
        assert_eq!(parent_key("total"), None);
        assert_eq!(parent_key("staked.unlocking"), Some("staked"));
        assert_eq!(
            parent_key("staked.unlocking.0-1 years"),
            Some("staked.unlocking")
        );
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth("total"), 0);
        assert_eq!(depth("burned.fees"), 1);
        assert_eq!(depth("rewards.locked.8+ years"), 2);
    }

    #[test]
    fn test_canonical_children_detection() {
        assert!(has_canonical_children("staked"));
        assert!(has_canonical_children("rewards.allocation"));
        assert!(!has_canonical_children("staked.community"));
        assert!(!has_canonical_children("liquid"));
        assert!(!has_canonical_children("burned.fees"));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("total"), "Total");
        assert_eq!(display_name("staked.unlocking"), "→ Unlocking");
        assert_eq!(display_name("staked.unlocking.3-4 years"), "→ → 3-4 years");
        assert_eq!(display_name("rewards.allocation.nodes"), "→ → Nodes");
    }

    #[test]
    fn test_default_expanded_are_roots() {
        for key in DEFAULT_EXPANDED {
            assert!(is_canonical(key));
            assert_eq!(depth(key), 0);
            assert!(has_canonical_children(key));
        }
    }
}
