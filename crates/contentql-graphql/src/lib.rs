//! # contentql-graphql
//!
//! GraphQL API over a hierarchical content repository, with a schema that is
//! composed at runtime.
//!
//! ## Overview
//!
//! The schema is assembled from independently authored SDL definition files
//! plus fields synthesized from delivery endpoint configuration. Query fields
//! tagged `@definition` or `@delivery` are bound to resolvers that list the
//! children of a node in the content repository. Any change to the set of
//! definitions rebuilds the whole schema and publishes it as a new snapshot.
//!
//! ## Endpoints
//!
//! - `POST /graphql` - Execute a query
//! - `GET /graphql` - Execute a query passed as URL parameters
//! - `GET /graphql/sdl` - SDL of the published schema
//!
//! ## Configuration
//!
//! Add to `contentql.toml`:
//!
//! ```toml
//! [graphql]
//! introspection = true
//!
//! [graphql.definitions]
//! root = "./light-modules"
//!
//! [[graphql.delivery]]
//! name = "tours/v1"
//! workspace = "tours"
//! node_types = ["mgnl:content"]
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`content`] - Lazy, filterable view over repository nodes
//! - [`schema`] - Fragment merging, schema compilation and snapshots
//! - [`definition`] - Definition files, lazy providers and the file watcher
//! - [`registry`] - Registered definitions and rebuild triggering
//! - [`context`] - GraphQL execution context
//! - [`handler`] - Axum HTTP handlers
//! - [`error`] - Error types for GraphQL operations

pub mod config;
pub mod content;
pub mod context;
pub mod definition;
pub mod error;
pub mod handler;
pub mod registry;
pub mod resolvers;
pub mod schema;

// Re-export main types
pub use config::{DefinitionsConfig, DeliveryEndpoint, GraphQLConfig};
pub use content::{ContentNode, ContentProperty};
pub use context::{GraphQLContext, GraphQLContextBuilder};
pub use definition::{
    DefinitionPathPattern, DefinitionProvider, DefinitionSource, FileSystemOrigin,
    LazyDefinitionProvider, StaticDefinitionProvider,
};
pub use error::GraphQLError;
pub use handler::{GraphQLState, graphql_handler, graphql_handler_get, sdl_handler};
pub use registry::{RegistryEvent, RegistryEventKind, SchemaRegistry, spawn_rebuild_listener};
pub use schema::{ContentSchemaBuilder, LiveSchema, SchemaBuilderConfig, SchemaSnapshot};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
