//! Error types for GraphQL operations.
//!
//! Errors are converted either to HTTP responses (schema availability) or to
//! per-field GraphQL errors carrying a `code` extension (content access).

use std::fmt;

use async_graphql::ErrorExtensions;
use contentql_storage::StorageError;

/// Errors that can occur in the GraphQL layer.
#[derive(Debug, Clone)]
pub enum GraphQLError {
    /// No schema snapshot has been published yet - client should retry.
    SchemaUnavailable,

    /// Schema build failed.
    SchemaBuildFailed(String),

    /// A schema fragment could not be parsed.
    InvalidSdl(String),

    /// The HTTP request could not be turned into a GraphQL request.
    InvalidRequest(String),

    /// The workspace named by a field does not exist.
    WorkspaceNotFound(String),

    /// No node exists at the requested path.
    NodeNotFound {
        /// Workspace that was searched.
        workspace: String,
        /// Path that was looked up.
        path: String,
    },

    /// A query field has no resolver attached.
    FieldNotResolvable {
        /// Owning type, usually `Query`.
        type_name: String,
        /// Field name.
        field: String,
    },

    /// Content repository error.
    Storage(String),

    /// Internal server error.
    Internal(String),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaUnavailable => {
                write!(f, "GraphQL schema is not available yet, please retry")
            }
            Self::SchemaBuildFailed(msg) => {
                write!(f, "Failed to build GraphQL schema: {msg}")
            }
            Self::InvalidSdl(msg) => {
                write!(f, "Invalid schema definition: {msg}")
            }
            Self::InvalidRequest(msg) => {
                write!(f, "Invalid GraphQL request: {msg}")
            }
            Self::WorkspaceNotFound(workspace) => {
                write!(f, "Workspace {workspace} not found")
            }
            Self::NodeNotFound { workspace, path } => {
                write!(f, "No node at {path} in workspace {workspace}")
            }
            Self::FieldNotResolvable { type_name, field } => {
                write!(f, "Field {type_name}.{field} is not resolvable")
            }
            Self::Storage(msg) => {
                write!(f, "Storage error: {msg}")
            }
            Self::Internal(msg) => {
                write!(f, "Internal error: {msg}")
            }
        }
    }
}

impl std::error::Error for GraphQLError {}

impl GraphQLError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaUnavailable => 503,
            Self::SchemaBuildFailed(_) => 500,
            Self::InvalidSdl(_) | Self::InvalidRequest(_) => 400,
            Self::WorkspaceNotFound(_) | Self::NodeNotFound { .. } => 404,
            Self::FieldNotResolvable { .. } => 400,
            Self::Storage(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaUnavailable => "SCHEMA_UNAVAILABLE",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::InvalidSdl(_) => "INVALID_SDL",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::WorkspaceNotFound(_) => "WORKSPACE_NOT_FOUND",
            Self::NodeNotFound { .. } => "NODE_NOT_FOUND",
            Self::FieldNotResolvable { .. } => "FIELD_NOT_RESOLVABLE",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the Retry-After header value in seconds, if applicable.
    #[must_use]
    pub fn retry_after(&self) -> Option<u32> {
        match self {
            Self::SchemaUnavailable => Some(5),
            _ => None,
        }
    }
}

impl ErrorExtensions for GraphQLError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.error_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

impl From<StorageError> for GraphQLError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::WorkspaceNotFound { workspace } => Self::WorkspaceNotFound(workspace),
            StorageError::NodeNotFound { workspace, path } => {
                Self::NodeNotFound { workspace, path }
            }
            other => Self::Storage(other.to_string()),
        }
    }
}
