//! GraphQL configuration.
//!
//! Configuration is read from the `[graphql]` section of `contentql.toml`.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! introspection = true
//!
//! [graphql.definitions]
//! root = "./light-modules"
//! watch = true
//!
//! [[graphql.delivery]]
//! name = "tours/v1"
//! workspace = "tours"
//! root_path = "/"
//! node_types = ["mgnl:content"]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schema::SchemaBuilderConfig;

/// GraphQL API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// SDL file replacing the built-in core fragment.
    #[serde(default)]
    pub core_schema: Option<PathBuf>,

    /// Where schema definition files are discovered.
    #[serde(default)]
    pub definitions: DefinitionsConfig,

    /// Content-access endpoints exposed as synthesized query fields.
    #[serde(default)]
    pub delivery: Vec<DeliveryEndpoint>,
}

fn default_introspection() -> bool {
    true
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            introspection: default_introspection(),
            core_schema: None,
            definitions: DefinitionsConfig::default(),
            delivery: Vec::new(),
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.definitions.validate()?;

        let mut seen = std::collections::HashSet::new();
        for endpoint in &self.delivery {
            if endpoint.name.trim().is_empty() {
                return Err("graphql.delivery[].name must not be empty".into());
            }
            if endpoint.workspace.trim().is_empty() {
                return Err(format!(
                    "graphql.delivery[{}].workspace must not be empty",
                    endpoint.name
                ));
            }
            if !seen.insert(endpoint.name.as_str()) {
                return Err(format!("graphql.delivery[{}] is declared twice", endpoint.name));
            }
        }
        Ok(())
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            introspection_enabled: self.introspection,
        }
    }
}

/// Location and naming convention of definition files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    /// Root directory scanned for `/<module>/<folder>/.../<name>.<extension>`.
    /// Definitions are disabled when unset.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Definition-type folder inside each module.
    /// Default: "graphqls"
    #[serde(default = "default_folder")]
    pub folder: String,

    /// File extension routed to this engine.
    /// Default: "graphql"
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Watch the root for changes.
    /// Default: true
    #[serde(default = "default_watch")]
    pub watch: bool,

    /// Debounce window for file events in milliseconds.
    /// Default: 500
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_folder() -> String {
    "graphqls".to_string()
}

fn default_extension() -> String {
    "graphql".to_string()
}

fn default_watch() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            root: None,
            folder: default_folder(),
            extension: default_extension(),
            watch: default_watch(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl DefinitionsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.folder.is_empty() || self.folder.contains('/') {
            return Err("graphql.definitions.folder must be a single path segment".into());
        }
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err("graphql.definitions.extension must not be empty or start with '.'".into());
        }
        if self.watch && self.debounce_ms == 0 {
            return Err("graphql.definitions.debounce_ms must be > 0 when watching".into());
        }
        Ok(())
    }
}

/// One content-access configuration record.
///
/// Each record becomes a `Query` field tagged with `@delivery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEndpoint {
    /// Stable identifier, e.g. `tours/v1`. Path separators become `_`
    /// in the field name.
    pub name: String,

    /// Workspace the field reads from.
    pub workspace: String,

    /// Node whose children are returned. Default: store root.
    #[serde(default)]
    pub root_path: Option<String>,

    /// Allowed primary types. Empty means unfiltered.
    #[serde(default)]
    pub node_types: Vec<String>,
}

impl DeliveryEndpoint {
    pub fn new(name: impl Into<String>, workspace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workspace: workspace.into(),
            root_path: None,
            node_types: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = Some(root_path.into());
        self
    }

    #[must_use]
    pub fn with_node_types<I, S>(mut self, node_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_types = node_types.into_iter().map(Into::into).collect();
        self
    }
}
