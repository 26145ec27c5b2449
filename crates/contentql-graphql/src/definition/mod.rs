//! Schema definition sources.
//!
//! Definition files are discovered in a [`ResourceOrigin`] by path convention
//! ([`DefinitionPathPattern`]), each wrapped in a [`LazyDefinitionProvider`]
//! and registered with the [`SchemaRegistry`](crate::registry::SchemaRegistry).
//! [`DefinitionSource::watch`] keeps the registry in step with the file system.

mod clock;
mod origin;
mod path;
mod problem;
mod provider;
mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use origin::{FileSystemOrigin, ResourceOrigin};
pub use path::{DefinitionMetadata, DefinitionPathPattern};
pub use problem::{Problem, ProblemKind, Severity, log_problems};
pub use provider::{
    DEFAULT_THRESHOLD_MS, DefinitionProvider, GraphQLDefinition, LazyDefinitionProvider,
    ProviderState, StaticDefinitionProvider,
};
pub use source::{DefinitionSource, WatchHandle};

/// Errors raised while locating or reading definition files.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid resource path: {0}")]
    InvalidPath(String),

    #[error("Invalid definition path pattern: {0}")]
    InvalidPattern(String),

    #[error("File watcher error: {0}")]
    Watch(String),
}

impl DefinitionError {
    pub fn io(path: &str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }
}
