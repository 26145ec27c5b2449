use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use contentql_storage::{
    ContentRepository, ContentSession, DynSession, NodeProperty, StorageError, StoredNode, path,
};
use papaya::HashMap as PapayaHashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Primary type of every workspace root node.
pub const ROOT_NODE_TYPE: &str = "rep:root";

/// One workspace: a flat path index plus the ordered child lists.
#[derive(Debug)]
struct WorkspaceTree {
    name: String,
    /// path -> node
    nodes: PapayaHashMap<String, StoredNode>,
    /// parent path -> child paths in insertion order
    children: RwLock<HashMap<String, Vec<String>>>,
}

impl WorkspaceTree {
    fn new(name: &str) -> Self {
        let nodes = PapayaHashMap::new();
        nodes
            .pin()
            .insert(path::ROOT.to_string(), StoredNode::new("", path::ROOT, ROOT_NODE_TYPE));
        Self {
            name: name.to_string(),
            nodes,
            children: RwLock::new(HashMap::new()),
        }
    }

    fn get(&self, path: &str) -> Option<StoredNode> {
        self.nodes.pin().get(path).cloned()
    }
}

/// In-memory content repository using papaya lock-free HashMaps.
///
/// Workspaces are created explicitly (or from a seed document) and hold a
/// `rep:root` node at `/`. Reads never block writers of other workspaces.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    workspaces: Arc<PapayaHashMap<String, Arc<WorkspaceTree>>>,
}

impl InMemoryRepository {
    /// Creates an empty repository without workspaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a workspace if it does not exist yet.
    ///
    /// Returns `true` if the workspace was created by this call.
    pub fn create_workspace(&self, name: &str) -> bool {
        let created = self
            .workspaces
            .pin()
            .try_insert(name.to_string(), Arc::new(WorkspaceTree::new(name)))
            .is_ok();
        if created {
            debug!(workspace = %name, "Created workspace");
        }
        created
    }

    /// Adds a node below `parent_path`, appending it to the parent's children.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WorkspaceNotFound` for unknown workspaces,
    /// `StorageError::NodeNotFound` if the parent does not exist and
    /// `StorageError::AlreadyExists` if the target path is taken.
    pub async fn add_node(
        &self,
        workspace: &str,
        parent_path: &str,
        name: &str,
        primary_type: &str,
        properties: Vec<NodeProperty>,
    ) -> Result<StoredNode, StorageError> {
        if name.is_empty() || name.contains('/') {
            return Err(StorageError::invalid_path(format!("{parent_path}/{name}")));
        }

        let tree = self.tree(workspace)?;
        let parent = path::normalize(parent_path)?;
        if tree.get(&parent).is_none() {
            return Err(StorageError::node_not_found(workspace, parent));
        }

        let node_path = path::join(&parent, name);
        let node = StoredNode {
            name: name.to_string(),
            path: node_path.clone(),
            primary_type: primary_type.to_string(),
            properties,
        };

        // Child list lock serializes inserts so order and uniqueness agree.
        let mut children = tree.children.write().await;
        let nodes = tree.nodes.pin();
        if nodes.contains_key(&node_path) {
            return Err(StorageError::already_exists(workspace, node_path));
        }
        nodes.insert(node_path.clone(), node.clone());
        children.entry(parent).or_default().push(node_path);

        Ok(node)
    }

    /// Number of nodes in a workspace, including its root.
    pub fn node_count(&self, workspace: &str) -> usize {
        self.workspaces
            .pin()
            .get(workspace)
            .map(|tree| tree.nodes.len())
            .unwrap_or(0)
    }

    fn tree(&self, workspace: &str) -> Result<Arc<WorkspaceTree>, StorageError> {
        self.workspaces
            .pin()
            .get(workspace)
            .cloned()
            .ok_or_else(|| StorageError::workspace_not_found(workspace))
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn session(&self, workspace: &str) -> Result<DynSession, StorageError> {
        let tree = self.tree(workspace)?;
        Ok(Arc::new(InMemorySession { tree }))
    }

    async fn workspaces(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self.workspaces.pin().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Read session over one in-memory workspace.
#[derive(Debug, Clone)]
pub struct InMemorySession {
    tree: Arc<WorkspaceTree>,
}

#[async_trait]
impl ContentSession for InMemorySession {
    fn workspace(&self) -> &str {
        &self.tree.name
    }

    async fn node(&self, path: &str) -> Result<Option<StoredNode>, StorageError> {
        let path = path::normalize(path)?;
        Ok(self.tree.get(&path))
    }

    async fn children(&self, path: &str) -> Result<Vec<StoredNode>, StorageError> {
        let path = path::normalize(path)?;
        if self.tree.get(&path).is_none() {
            return Err(StorageError::node_not_found(&self.tree.name, path));
        }

        let children = self.tree.children.read().await;
        let nodes = self.tree.nodes.pin();
        Ok(children
            .get(&path)
            .map(|paths| paths.iter().filter_map(|p| nodes.get(p).cloned()).collect())
            .unwrap_or_default())
    }
}
