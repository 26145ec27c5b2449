//! # contentql-storage
//!
//! Content repository abstraction for contentql.
//!
//! This crate defines the traits and types every hierarchical content store
//! backend must provide. It does not contain any implementations - those
//! live in separate crates (see `contentql-db-memory`).
//!
//! ## Overview
//!
//! A repository is split into named workspaces. Each workspace is a tree of
//! nodes addressed by absolute path (`/`, `/a`, `/a/b`). Every node has a
//! primary type and an ordered list of named properties.
//!
//! - [`ContentRepository`] opens sessions against a workspace
//! - [`ContentSession`] reads nodes and their direct children
//!
//! ## Example
//!
//! ```ignore
//! use contentql_storage::{ContentRepository, StorageError, StoredNode};
//!
//! async fn pages(
//!     repository: &dyn ContentRepository,
//! ) -> Result<Vec<StoredNode>, StorageError> {
//!     let session = repository.session("website").await?;
//!     session.children("/").await
//! }
//! ```

mod error;
pub mod path;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{ContentRepository, ContentSession};
pub use types::{NodeProperty, StoredNode};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shareable repository trait object.
pub type DynRepository = std::sync::Arc<dyn ContentRepository>;

/// Type alias for a shareable session trait object.
pub type DynSession = std::sync::Arc<dyn ContentSession>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use contentql_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ContentRepository, ContentSession, DynRepository, DynSession, NodeProperty, StorageError,
        StorageResult, StoredNode,
    };
}
