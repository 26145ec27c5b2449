//! Repository traits implemented by content store backends.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::StoredNode;
use crate::DynSession;

/// Entry point of a content store backend.
///
/// Implementations must be thread-safe (`Send + Sync`); a single repository
/// is shared by every resolver of every query.
///
/// # Example
///
/// ```ignore
/// use contentql_storage::{ContentRepository, StorageError, StoredNode};
///
/// async fn root(repository: &dyn ContentRepository) -> Result<StoredNode, StorageError> {
///     let session = repository.session("website").await?;
///     session
///         .node("/")
///         .await?
///         .ok_or_else(|| StorageError::node_not_found("website", "/"))
/// }
/// ```
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Opens a read session against a workspace.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WorkspaceNotFound` if the workspace does not exist.
    /// Returns `StorageError::ConnectionError` if the backend is unreachable.
    async fn session(&self, workspace: &str) -> Result<DynSession, StorageError>;

    /// Names of all workspaces, sorted.
    async fn workspaces(&self) -> Result<Vec<String>, StorageError>;

    /// Short backend identifier used in logs.
    fn backend_name(&self) -> &'static str;
}

/// A read session bound to one workspace.
#[async_trait]
pub trait ContentSession: Send + Sync {
    /// The workspace this session reads from.
    fn workspace(&self) -> &str;

    /// Reads the node at an absolute path.
    ///
    /// Returns `None` if no node exists there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for malformed paths, otherwise only
    /// for infrastructure issues.
    async fn node(&self, path: &str) -> Result<Option<StoredNode>, StorageError>;

    /// Lists the direct children of the node at `path` in store order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NodeNotFound` if there is no node at `path`.
    async fn children(&self, path: &str) -> Result<Vec<StoredNode>, StorageError>;
}
