//! Seeding an in-memory repository from a JSON document.
//!
//! The document maps workspace names to their top-level nodes:
//!
//! ```json
//! {
//!   "website": [
//!     {
//!       "name": "a",
//!       "nodeType": "mgnl:page",
//!       "properties": { "title": "A" },
//!       "children": [{ "name": "p1", "nodeType": "mgnl:page" }]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use contentql_storage::{NodeProperty, StorageError, path};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::InMemoryRepository;

/// Errors raised while loading a seed document.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid seed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One node of a seed document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedNode {
    pub name: String,
    #[serde(default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(default)]
    pub children: Vec<SeedNode>,
}

fn default_node_type() -> String {
    "mgnl:content".to_string()
}

impl InMemoryRepository {
    /// Builds a repository from a parsed seed document.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Json` if the document does not have the seed shape
    /// and `SeedError::Storage` for conflicting node paths.
    pub async fn from_seed(document: Value) -> Result<Self, SeedError> {
        let repository = Self::new();
        repository.load_seed(document).await?;
        Ok(repository)
    }

    /// Reads and loads a seed file.
    ///
    /// # Errors
    ///
    /// See [`InMemoryRepository::from_seed`]; also fails if the file cannot be read.
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SeedError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let document: Value = serde_json::from_str(&raw)?;
        Self::from_seed(document).await
    }

    /// Adds the workspaces and nodes of a seed document.
    ///
    /// Returns the number of nodes added.
    ///
    /// # Errors
    ///
    /// See [`InMemoryRepository::from_seed`].
    pub async fn load_seed(&self, document: Value) -> Result<usize, SeedError> {
        let workspaces: IndexMap<String, Vec<SeedNode>> = serde_json::from_value(document)?;

        let mut added = 0;
        for (workspace, nodes) in workspaces {
            self.create_workspace(&workspace);

            // Depth-first with an explicit stack, preserving sibling order.
            let mut pending: Vec<(String, SeedNode)> = nodes
                .into_iter()
                .rev()
                .map(|node| (path::ROOT.to_string(), node))
                .collect();

            while let Some((parent, node)) = pending.pop() {
                let properties = node
                    .properties
                    .into_iter()
                    .map(|(name, value)| NodeProperty::new(name, value))
                    .collect();
                let stored = self
                    .add_node(&workspace, &parent, &node.name, &node.node_type, properties)
                    .await?;
                added += 1;

                pending.extend(
                    node.children
                        .into_iter()
                        .rev()
                        .map(|child| (stored.path.clone(), child)),
                );
            }

            info!(workspace = %workspace, nodes = self.node_count(&workspace), "Seeded workspace");
        }

        Ok(added)
    }
}
