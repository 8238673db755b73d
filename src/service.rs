//! Owns the published tree and the view state.
//!
//! One service instance per process; no global caches. A refresh either
//! publishes a complete verified tree or leaves the last good one in place,
//! and a refresh that was superseded by a newer attempt can never publish.

use std::path::Path;

use anyhow::Result;

use crate::builder;
use crate::errors::MetricsError;
use crate::fetch::MetricSource;
use crate::keys::CANONICAL_KEYS;
use crate::logging::{self, obj, v_num, v_str, Domain, Level};
use crate::model::{MetricNode, SupplyTree};
use crate::snapshot::Snapshot;
use crate::state;
use crate::view::ViewState;

#[derive(Debug, Clone)]
pub struct Published {
    pub tree: SupplyTree,
    pub total_supply: f64,
    pub last_updated: String,
    pub fetched_at: u64,
}

pub struct SupplyService {
    source: Box<dyn MetricSource>,
    current: Option<Published>,
    previous: Option<Published>,
    view: ViewState,
    refresh_gen: u64,
    published_gen: u64,
}

impl SupplyService {
    pub fn new(source: Box<dyn MetricSource>) -> Self {
        Self {
            source,
            current: None,
            previous: None,
            view: ViewState::new(),
            refresh_gen: 0,
            published_gen: 0,
        }
    }

    /// Fetch, build, verify, publish. Any failure leaves the currently
    /// published tree untouched; the caller decides whether to surface the
    /// error or keep showing the last good data.
    pub async fn refresh(&mut self) -> Result<(), MetricsError> {
        let generation = self.begin_refresh();
        let raw = match self.source.fetch_all().await {
            Ok(raw) => raw,
            Err(err) => {
                logging::log(
                    Level::Error,
                    Domain::Fetch,
                    "refresh_failed",
                    obj(&[("msg", v_str(&err.to_string()))]),
                );
                return Err(err);
            }
        };
        let tree = match builder::build_tree(&raw) {
            Ok(tree) => tree,
            Err(err) => {
                logging::log(
                    Level::Error,
                    Domain::Build,
                    "refresh_failed",
                    obj(&[("msg", v_str(&err.to_string()))]),
                );
                return Err(err);
            }
        };
        let published = Published {
            total_supply: tree.get("total").map(|n| n.value).unwrap_or(0.0),
            last_updated: state::now_rfc3339(),
            fetched_at: state::now_ts_ms(),
            tree,
        };
        self.publish(generation, published);
        Ok(())
    }

    /// Adopt a previously persisted snapshot (startup path). The tree is
    /// re-verified: a corrupt file must not publish any more than a corrupt
    /// fetch would.
    pub fn adopt_snapshot(&mut self, snapshot: Snapshot) -> Result<(), MetricsError> {
        let tree = snapshot.to_tree();
        tree.verify()?;
        let generation = self.begin_refresh();
        self.publish(
            generation,
            Published {
                total_supply: snapshot.total_supply,
                last_updated: snapshot.last_updated,
                fetched_at: snapshot.fetched_at,
                tree,
            },
        );
        Ok(())
    }

    fn begin_refresh(&mut self) -> u64 {
        self.refresh_gen += 1;
        self.refresh_gen
    }

    /// Publication gate: only the newest refresh attempt may publish. Returns
    /// whether the tree was accepted.
    fn publish(&mut self, generation: u64, published: Published) -> bool {
        if generation <= self.published_gen {
            logging::log(
                Level::Warn,
                Domain::System,
                "refresh_superseded",
                obj(&[
                    ("generation", v_num(generation as f64)),
                    ("published", v_num(self.published_gen as f64)),
                    ("msg", v_str("discarding result of superseded refresh")),
                ]),
            );
            return false;
        }
        self.published_gen = generation;
        self.previous = self.current.take();
        self.current = Some(published);
        true
    }

    pub fn has_data(&self) -> bool {
        self.current.is_some()
    }

    pub fn tree(&self) -> Option<&SupplyTree> {
        self.current.as_ref().map(|p| &p.tree)
    }

    /// Tree from the refresh before the current one, retained as a fallback.
    pub fn previous_tree(&self) -> Option<&SupplyTree> {
        self.previous.as_ref().map(|p| &p.tree)
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.current.as_ref().map(|p| {
            Snapshot::from_tree(&p.tree, p.total_supply, p.last_updated.clone(), p.fetched_at)
        })
    }

    /// Persist the current snapshot; returns false when there is nothing to
    /// persist yet.
    pub fn persist(&self, path: &Path) -> Result<bool> {
        match self.snapshot() {
            Some(snapshot) => {
                snapshot.save(path)?;
                logging::log(
                    Level::Info,
                    Domain::Snapshot,
                    "snapshot_saved",
                    obj(&[
                        ("path", v_str(&path.display().to_string())),
                        ("total_supply", v_num(snapshot.total_supply)),
                    ]),
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn total_supply(&self) -> f64 {
        self.current.as_ref().map(|p| p.total_supply).unwrap_or(0.0)
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.current.as_ref().map(|p| p.last_updated.as_str())
    }

    pub fn fetched_at(&self) -> Option<u64> {
        self.current.as_ref().map(|p| p.fetched_at)
    }

    pub fn node(&self, key: &str) -> Option<&MetricNode> {
        self.tree().and_then(|t| t.get(key))
    }

    pub fn canonical_keys(&self) -> &'static [&'static str] {
        &CANONICAL_KEYS
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.tree()
            .map(|t| self.view.is_visible(key, t))
            .unwrap_or(false)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }
}
