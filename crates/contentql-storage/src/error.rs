//! Storage error types for the content repository abstraction.

use std::fmt;

/// Errors that can occur while reading from a content repository.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// The requested workspace does not exist.
    #[error("Workspace not found: {workspace}")]
    WorkspaceNotFound {
        /// Name of the missing workspace.
        workspace: String,
    },

    /// No node exists at the requested path.
    #[error("Node not found: {workspace}:{path}")]
    NodeNotFound {
        /// Workspace that was searched.
        workspace: String,
        /// Absolute path that was looked up.
        path: String,
    },

    /// The path is not a valid absolute node path.
    #[error("Invalid path: {path}")]
    InvalidPath {
        /// The rejected path.
        path: String,
    },

    /// A node with the same path already exists.
    #[error("Node already exists: {workspace}:{path}")]
    AlreadyExists {
        /// Workspace of the conflicting node.
        workspace: String,
        /// Path of the conflicting node.
        path: String,
    },

    /// Failed to reach the repository backend.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the connection error.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `WorkspaceNotFound` error.
    #[must_use]
    pub fn workspace_not_found(workspace: impl Into<String>) -> Self {
        Self::WorkspaceNotFound {
            workspace: workspace.into(),
        }
    }

    /// Creates a new `NodeNotFound` error.
    #[must_use]
    pub fn node_not_found(workspace: impl Into<String>, path: impl Into<String>) -> Self {
        Self::NodeNotFound {
            workspace: workspace.into(),
            path: path.into(),
        }
    }

    /// Creates a new `InvalidPath` error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(workspace: impl Into<String>, path: impl Into<String>) -> Self {
        Self::AlreadyExists {
            workspace: workspace.into(),
            path: path.into(),
        }
    }

    /// Creates a new `ConnectionError` error.
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the workspace or node was not found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::WorkspaceNotFound { .. } | Self::NodeNotFound { .. }
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::WorkspaceNotFound { .. } | Self::NodeNotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidPath { .. } => ErrorCategory::Validation,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::ConnectionError { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Workspace or node not found.
    NotFound,
    /// Malformed input.
    Validation,
    /// Node already exists.
    Conflict,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
