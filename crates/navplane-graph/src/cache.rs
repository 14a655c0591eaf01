//! Unified-graph cache (spec.md §4.2), grounded exactly in
//! `navigation_cache.py`: an in-memory map keyed by
//! `unified_{root_tree_id}_{team_id}` with a TTL and an explicit
//! timestamp-refresh operation that doesn't rebuild the graph.

use dashmap::DashMap;
use navplane_core::TreeId;
use std::sync::Arc;
use std::time::Duration;

use crate::model::Graph;

/// Default TTL, matching the original's `CACHE_CONFIG['LONG_TTL']` (24h).
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

fn cache_key(root_tree_id: &TreeId, team_id: &str) -> String {
    format!("unified_{}_{}", root_tree_id.as_str(), team_id)
}

struct CacheEntry {
    graph: Arc<Graph>,
    cached_at: chrono::DateTime<chrono::Utc>,
}

/// `DashMap`-backed cache registry, following the teacher's convention of
/// wrapping a `DashMap` in a small registry struct rather than exposing it
/// directly.
pub struct UnifiedGraphCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for UnifiedGraphCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl UnifiedGraphCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    /// `get_cached_unified_graph`: returns the cached graph if present and
    /// not yet expired, evicting it if it has aged out.
    pub fn get(&self, root_tree_id: &TreeId, team_id: &str) -> Option<Arc<Graph>> {
        let key = cache_key(root_tree_id, team_id);
        let expired = match self.entries.get(&key) {
            Some(entry) => {
                let age = chrono::Utc::now().signed_duration_since(entry.cached_at);
                age.to_std().map(|age| age > self.ttl).unwrap_or(true)
            }
            None => return None,
        };
        if expired {
            self.entries.remove(&key);
            return None;
        }
        self.entries.get(&key).map(|entry| entry.graph.clone())
    }

    /// `populate_unified_cache`: stores a freshly built graph under the
    /// cache key, stamping the current time.
    pub fn populate(&self, root_tree_id: &TreeId, team_id: &str, graph: Graph) -> Arc<Graph> {
        let key = cache_key(root_tree_id, team_id);
        let graph = Arc::new(graph);
        self.entries.insert(
            key,
            CacheEntry {
                graph: graph.clone(),
                cached_at: chrono::Utc::now(),
            },
        );
        graph
    }

    /// `save_unified_cache`: direct store for incremental updates, same
    /// shape as `populate` (kept distinct for call-site clarity — the
    /// original separates "first build" from "incremental patch write").
    pub fn save(&self, root_tree_id: &TreeId, team_id: &str, graph: Graph) -> Arc<Graph> {
        self.populate(root_tree_id, team_id, graph)
    }

    /// `refresh_cache_timestamp`: bump the cached-at time without
    /// rebuilding. No-op (returns `false`) if nothing is cached under this
    /// key.
    pub fn refresh_timestamp(&self, root_tree_id: &TreeId, team_id: &str) -> bool {
        let key = cache_key(root_tree_id, team_id);
        match self.entries.get_mut(&key) {
            Some(mut entry) => {
                entry.cached_at = chrono::Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn invalidate(&self, root_tree_id: &TreeId, team_id: &str) {
        self.entries.remove(&cache_key(root_tree_id, team_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_then_get_round_trips() {
        let cache = UnifiedGraphCache::default();
        let root = TreeId::new("root-1");
        cache.populate(&root, "team-a", Graph::new());
        assert!(cache.get(&root, "team-a").is_some());
    }

    #[test]
    fn different_team_is_a_different_key() {
        let cache = UnifiedGraphCache::default();
        let root = TreeId::new("root-1");
        cache.populate(&root, "team-a", Graph::new());
        assert!(cache.get(&root, "team-b").is_none());
    }

    #[test]
    fn expired_entry_is_evicted_on_get() {
        let cache = UnifiedGraphCache::new(Duration::from_secs(0));
        let root = TreeId::new("root-1");
        cache.populate(&root, "team-a", Graph::new());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&root, "team-a").is_none());
    }

    #[test]
    fn refresh_timestamp_on_missing_key_is_noop() {
        let cache = UnifiedGraphCache::default();
        assert!(!cache.refresh_timestamp(&TreeId::new("nope"), "team-a"));
    }
}
