//! Expand/collapse view state.
//!
//! A node is visible iff every ancestor on its path is expanded; roots are
//! always visible. All operations are synchronous and total, and take effect
//! on the next visibility query.

use std::collections::HashSet;

use crate::keys::DEFAULT_EXPANDED;
use crate::model::SupplyTree;

#[derive(Debug, Clone)]
pub struct ViewState {
    expanded: HashSet<String>,
}

impl ViewState {
    /// Fresh state with the default categories expanded.
    pub fn new() -> Self {
        let mut state = Self {
            expanded: HashSet::new(),
        };
        state.expand_defaults();
        state
    }

    pub fn expand(&mut self, key: &str) {
        self.expanded.insert(key.to_string());
    }

    pub fn collapse(&mut self, key: &str) {
        self.expanded.remove(key);
    }

    pub fn toggle(&mut self, key: &str) {
        if !self.expanded.remove(key) {
            self.expanded.insert(key.to_string());
        }
    }

    pub fn set_expanded(&mut self, keys: HashSet<String>) {
        self.expanded = keys;
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn expand_defaults(&mut self) {
        self.expanded = DEFAULT_EXPANDED.iter().map(|k| k.to_string()).collect();
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Walks the ancestor chain through the tree's parent index. Collapsing a
    /// grandparent hides descendants even when intermediate levels remain in
    /// the expanded set.
    pub fn is_visible(&self, key: &str, tree: &SupplyTree) -> bool {
        let Some(node) = tree.get(key) else {
            return false;
        };
        let mut ancestor = node.parent.as_deref();
        while let Some(parent) = ancestor {
            if !self.expanded.contains(parent) {
                return false;
            }
            ancestor = tree.parent_of(parent);
        }
        true
    }

    /// Visible keys in canonical display order.
    pub fn visible_keys<'a>(&self, tree: &'a SupplyTree) -> Vec<&'a str> {
        tree.iter()
            .filter(|n| self.is_visible(&n.key, tree))
            .map(|n| n.key.as_str())
            .collect()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tree() -> SupplyTree {
        SupplyTree::from_values(&HashMap::new())
    }

    #[test]
    fn test_roots_always_visible() {
        let tree = tree();
        let mut view = ViewState::new();
        view.collapse_all();
        for key in ["total", "liquid", "staked", "rewards", "burned"] {
            assert!(view.is_visible(key, &tree), "{} should be visible", key);
        }
    }

    #[test]
    fn test_collapse_all_hides_every_nested_row() {
        let tree = tree();
        let mut view = ViewState::new();
        view.collapse_all();
        let visible = view.visible_keys(&tree);
        assert_eq!(visible, vec!["total", "liquid", "staked", "rewards", "burned"]);
    }

    #[test]
    fn test_partial_expansion() {
        let tree = tree();
        let mut view = ViewState::new();
        view.collapse_all();
        view.expand("staked");
        assert!(view.is_visible("staked.unlocking", &tree));
        assert!(!view.is_visible("staked.unlocking.0-1 years", &tree));
    }

    #[test]
    fn test_collapsed_grandparent_hides_descendants() {
        let tree = tree();
        let mut view = ViewState::new();
        view.collapse_all();
        // Child expanded but its parent chain is not.
        view.expand("staked.unlocking");
        assert!(!view.is_visible("staked.unlocking.0-1 years", &tree));
        view.expand("staked");
        assert!(view.is_visible("staked.unlocking.0-1 years", &tree));
    }

    #[test]
    fn test_defaults_show_level_one() {
        let tree = tree();
        let view = ViewState::new();
        assert!(view.is_visible("staked.unlocking", &tree));
        assert!(view.is_visible("burned.fees", &tree));
        assert!(!view.is_visible("staked.unlocking.0-1 years", &tree));
    }

    #[test]
    fn test_expansion_is_monotonic() {
        let tree = tree();
        let mut view = ViewState::new();
        view.collapse_all();
        view.expand("staked");
        let before: Vec<String> = view
            .visible_keys(&tree)
            .into_iter()
            .map(String::from)
            .collect();
        view.expand("rewards");
        let after = view.visible_keys(&tree);
        for key in &before {
            assert!(
                after.contains(&key.as_str()),
                "{} disappeared after expanding another key",
                key
            );
        }
    }

    #[test]
    fn test_collapse_then_defaults_idempotent() {
        let tree = tree();
        let mut view = ViewState::new();
        view.collapse_all();
        view.expand_defaults();
        let once: Vec<&str> = view.visible_keys(&tree);
        view.collapse_all();
        view.expand_defaults();
        assert_eq!(view.visible_keys(&tree), once);
    }

    #[test]
    fn test_toggle_round_trip() {
        let tree = tree();
        let mut view = ViewState::new();
        let baseline = view.visible_keys(&tree).len();
        view.toggle("staked");
        assert!(view.visible_keys(&tree).len() < baseline);
        view.toggle("staked");
        assert_eq!(view.visible_keys(&tree).len(), baseline);
    }

    #[test]
    fn test_unknown_key_never_visible() {
        let tree = tree();
        let view = ViewState::new();
        assert!(!view.is_visible("nonsense.path", &tree));
    }
}
