//! Persistence contract (spec.md §6): the crate never talks to a real
//! database; callers supply an implementation of `PersistenceBackend`.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{Edge, Node, NodeId, TreeId};

/// Everything needed to reconstruct one navigation tree (spec.md §6).
#[derive(Clone, Debug, Default)]
pub struct FullTree {
    pub tree_id: Option<TreeId>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Storage contract for navigation trees (spec.md §6 "Persistence").
///
/// The crate never talks to a real database directly; callers supply an
/// implementation backed by whatever store they use.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn load_root_tree_id(&self, userinterface_id: &str) -> Result<TreeId>;

    async fn load_tree_hierarchy(&self, root_tree_id: &TreeId) -> Result<Vec<TreeId>>;

    async fn load_full_tree(&self, tree_id: &TreeId) -> Result<FullTree>;

    /// Incremental write during exploration (spec.md §4.6): add or replace
    /// a single node/edge without reloading the whole tree.
    async fn upsert_node(&self, tree_id: &TreeId, node: Node) -> Result<()>;

    async fn upsert_edge(&self, tree_id: &TreeId, edge: Edge) -> Result<()>;

    async fn delete_node(&self, tree_id: &TreeId, node_id: &NodeId) -> Result<()>;
}

/// In-memory `PersistenceBackend`, sufficient for tests and for driving the
/// gateway in isolation (spec.md §1's "in-memory/no-op implementations").
#[derive(Default)]
pub struct MemoryPersistence {
    roots: RwLock<HashMap<String, TreeId>>,
    hierarchies: RwLock<HashMap<TreeId, Vec<TreeId>>>,
    trees: RwLock<HashMap<TreeId, FullTree>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_root(&self, userinterface_id: impl Into<String>, root_tree_id: TreeId) {
        self.roots.write().await.insert(userinterface_id.into(), root_tree_id);
    }

    pub async fn seed_hierarchy(&self, root_tree_id: TreeId, trees: Vec<TreeId>) {
        self.hierarchies.write().await.insert(root_tree_id, trees);
    }

    pub async fn seed_tree(&self, tree_id: TreeId, tree: FullTree) {
        self.trees.write().await.insert(tree_id, tree);
    }
}

#[async_trait]
impl PersistenceBackend for MemoryPersistence {
    async fn load_root_tree_id(&self, userinterface_id: &str) -> Result<TreeId> {
        self.roots
            .read()
            .await
            .get(userinterface_id)
            .cloned()
            .ok_or_else(|| crate::error::Error::UserInterfaceNotFound(userinterface_id.to_string()))
    }

    async fn load_tree_hierarchy(&self, root_tree_id: &TreeId) -> Result<Vec<TreeId>> {
        Ok(self
            .hierarchies
            .read()
            .await
            .get(root_tree_id)
            .cloned()
            .unwrap_or_else(|| vec![root_tree_id.clone()]))
    }

    async fn load_full_tree(&self, tree_id: &TreeId) -> Result<FullTree> {
        self.trees
            .read()
            .await
            .get(tree_id)
            .cloned()
            .ok_or_else(|| crate::error::Error::NavigationTree(format!("unknown tree {tree_id}")))
    }

    async fn upsert_node(&self, tree_id: &TreeId, node: Node) -> Result<()> {
        let mut trees = self.trees.write().await;
        let tree = trees.entry(tree_id.clone()).or_insert_with(|| FullTree {
            tree_id: Some(tree_id.clone()),
            nodes: vec![],
            edges: vec![],
        });
        if let Some(existing) = tree.nodes.iter_mut().find(|n| n.node_id == node.node_id) {
            *existing = node;
        } else {
            tree.nodes.push(node);
        }
        Ok(())
    }

    async fn upsert_edge(&self, tree_id: &TreeId, edge: Edge) -> Result<()> {
        let mut trees = self.trees.write().await;
        let tree = trees.entry(tree_id.clone()).or_insert_with(|| FullTree {
            tree_id: Some(tree_id.clone()),
            nodes: vec![],
            edges: vec![],
        });
        if let Some(existing) = tree.edges.iter_mut().find(|e| e.edge_id == edge.edge_id) {
            *existing = edge;
        } else {
            tree.edges.push(edge);
        }
        Ok(())
    }

    async fn delete_node(&self, tree_id: &TreeId, node_id: &NodeId) -> Result<()> {
        if let Some(tree) = self.trees.write().await.get_mut(tree_id) {
            tree.nodes.retain(|n| &n.node_id != node_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_and_loads_root() {
        let store = MemoryPersistence::new();
        store.seed_root("ui-1", TreeId::new("tree-1")).await;
        let root = store.load_root_tree_id("ui-1").await.unwrap();
        assert_eq!(root.as_str(), "tree-1");
    }

    #[tokio::test]
    async fn missing_userinterface_errors() {
        let store = MemoryPersistence::new();
        let err = store.load_root_tree_id("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn upsert_node_then_load() {
        let store = MemoryPersistence::new();
        let tree_id = TreeId::new("t1");
        store
            .upsert_node(
                &tree_id,
                Node {
                    node_id: "n1".into(),
                    label: "Home".into(),
                    node_type: crate::types::NodeType::Screen,
                    position: Default::default(),
                    data: serde_json::Value::Null,
                    verifications: vec![],
                    verification_pass_condition: Default::default(),
                    child_tree_id: None,
                },
            )
            .await
            .unwrap();
        let tree = store.load_full_tree(&tree_id).await.unwrap();
        assert_eq!(tree.nodes.len(), 1);
    }
}
