//! Lazy, filterable view over content repository nodes.
//!
//! A [`ContentNode`] wraps one stored node together with the session it was
//! read from and the node-type filter inherited from the field that produced
//! it. Children are read on first access and cached for the lifetime of the
//! view; every child carries the same filter as its parent.

use std::sync::Arc;

use contentql_storage::{
    ContentRepository, ContentSession, DynRepository, DynSession, NodeProperty, StorageError,
    StoredNode,
};
use tokio::sync::OnceCell;
use tracing::debug;

/// A view over one content node.
#[derive(Clone)]
pub struct ContentNode {
    session: DynSession,
    item: Arc<StoredNode>,
    node_types: Arc<[String]>,
    children: Arc<OnceCell<Vec<ContentNode>>>,
}

impl ContentNode {
    /// Wraps a stored node read through `session`.
    pub fn new(session: DynSession, item: StoredNode, node_types: Arc<[String]>) -> Self {
        Self {
            session,
            item: Arc::new(item),
            node_types,
            children: Arc::new(OnceCell::new()),
        }
    }

    /// Opens a session against `workspace` and wraps the node at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NodeNotFound` if there is no node at `path`,
    /// otherwise whatever the repository reports.
    pub async fn open(
        repository: &DynRepository,
        workspace: &str,
        path: &str,
        node_types: Arc<[String]>,
    ) -> Result<Self, StorageError> {
        let session = repository.session(workspace).await?;
        let item = session
            .node(path)
            .await?
            .ok_or_else(|| StorageError::node_not_found(workspace, path))?;
        Ok(Self::new(session, item, node_types))
    }

    pub fn name(&self) -> &str {
        &self.item.name
    }

    pub fn path(&self) -> &str {
        &self.item.path
    }

    /// Primary node type.
    pub fn node_type(&self) -> &str {
        &self.item.primary_type
    }

    pub fn workspace(&self) -> &str {
        self.session.workspace()
    }

    /// The filter applied to this node's children.
    pub fn node_types(&self) -> &[String] {
        &self.node_types
    }

    /// All properties in store order.
    pub fn properties(&self) -> Vec<ContentProperty> {
        self.item
            .properties
            .iter()
            .cloned()
            .map(ContentProperty::new)
            .collect()
    }

    /// A single property by name.
    pub fn property(&self, name: &str) -> Option<ContentProperty> {
        self.item.property(name).cloned().map(ContentProperty::new)
    }

    /// Whether a node of `primary_type` passes this node's filter.
    pub fn accepts(&self, primary_type: &str) -> bool {
        self.node_types.is_empty() || self.node_types.iter().any(|t| t == primary_type)
    }

    /// Direct children in store order, restricted to the inherited node types.
    ///
    /// The repository is read once per view; later calls return the cached list.
    ///
    /// # Errors
    ///
    /// Propagates the repository error of the first read. A failed read is
    /// not cached.
    pub async fn children(&self) -> Result<&[ContentNode], StorageError> {
        let children = self
            .children
            .get_or_try_init(|| async {
                let stored = self.session.children(&self.item.path).await?;
                let total = stored.len();
                let kept: Vec<ContentNode> = stored
                    .into_iter()
                    .filter(|child| self.accepts(&child.primary_type))
                    .map(|child| {
                        ContentNode::new(self.session.clone(), child, self.node_types.clone())
                    })
                    .collect();
                debug!(
                    workspace = %self.workspace(),
                    path = %self.item.path,
                    total,
                    kept = kept.len(),
                    "Materialized children"
                );
                Ok::<_, StorageError>(kept)
            })
            .await?;
        Ok(children.as_slice())
    }

    /// Reads a field by its schema name.
    pub async fn field(&self, field: &NodeField) -> Result<NodeValue, StorageError> {
        Ok(match field {
            NodeField::Name => NodeValue::Text(Some(self.name().to_string())),
            NodeField::Path => NodeValue::Text(Some(self.path().to_string())),
            NodeField::NodeType => NodeValue::Text(Some(self.node_type().to_string())),
            NodeField::Properties => NodeValue::Properties(self.properties()),
            NodeField::Children => NodeValue::Nodes(self.children().await?.to_vec()),
            NodeField::Property(name) => NodeValue::Property(self.property(name)),
        })
    }
}

impl std::fmt::Debug for ContentNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentNode")
            .field("workspace", &self.workspace())
            .field("path", &self.item.path)
            .field("node_type", &self.item.primary_type)
            .field("node_types", &self.node_types)
            .finish()
    }
}

/// Structured accessors of a content node, keyed by schema field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeField {
    Name,
    Path,
    NodeType,
    Properties,
    Children,
    /// Any other field name reads the node property of that name.
    Property(String),
}

impl NodeField {
    pub fn from_name(name: &str) -> Self {
        match name {
            "name" => Self::Name,
            "path" => Self::Path,
            "nodeType" => Self::NodeType,
            "properties" => Self::Properties,
            "children" => Self::Children,
            other => Self::Property(other.to_string()),
        }
    }
}

/// Result of [`ContentNode::field`].
#[derive(Debug, Clone)]
pub enum NodeValue {
    Text(Option<String>),
    Properties(Vec<ContentProperty>),
    Nodes(Vec<ContentNode>),
    Property(Option<ContentProperty>),
}

/// A view over one node property.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentProperty {
    inner: NodeProperty,
}

impl ContentProperty {
    pub fn new(inner: NodeProperty) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// String rendition of the value, `None` for null.
    pub fn string(&self) -> Option<String> {
        self.inner.as_string()
    }

    /// Property type name, e.g. `String` or `Long`.
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.inner.value
    }
}
