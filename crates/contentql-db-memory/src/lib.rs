//! In-memory content repository for contentql.
//!
//! This crate provides an implementation of the `ContentRepository` trait
//! from `contentql-storage`, using papaya lock-free HashMaps for concurrent
//! access. Child order is the insertion order.
//!
//! # Example
//!
//! ```ignore
//! use contentql_db_memory::InMemoryRepository;
//! use contentql_storage::ContentRepository;
//!
//! let repository = InMemoryRepository::new();
//! repository.create_workspace("website");
//! repository
//!     .add_node("website", "/", "home", "mgnl:page", vec![])
//!     .await?;
//!
//! let session = repository.session("website").await?;
//! let children = session.children("/").await?;
//! ```

mod repository;
pub mod seed;

pub use contentql_storage::{ContentRepository, ContentSession, StorageError, StoredNode};
pub use repository::{InMemoryRepository, InMemorySession, ROOT_NODE_TYPE};
pub use seed::{SeedError, SeedNode};

/// Creates a new, empty in-memory repository behind a shareable handle.
pub fn create_repository() -> contentql_storage::DynRepository {
    std::sync::Arc::new(InMemoryRepository::new())
}
