//! GraphQL execution context.
//!
//! The context is constructed per request and carries the content repository
//! that resolvers read from.
//!
//! # Example
//!
//! ```ignore
//! use contentql_graphql::GraphQLContextBuilder;
//!
//! let context = GraphQLContextBuilder::new()
//!     .with_repository(repository.clone())
//!     .with_request_id("req-123")
//!     .build()?;
//! ```

use contentql_storage::DynRepository;

/// GraphQL execution context.
///
/// Cheap to clone; the repository is shared behind an `Arc`.
#[derive(Clone)]
pub struct GraphQLContext {
    /// Content repository resolvers read from.
    pub repository: DynRepository,

    /// Request ID for tracing and correlation.
    pub request_id: String,
}

impl GraphQLContext {
    /// Creates a new builder for GraphQLContext.
    #[must_use]
    pub fn builder() -> GraphQLContextBuilder {
        GraphQLContextBuilder::default()
    }
}

impl std::fmt::Debug for GraphQLContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLContext")
            .field("repository", &self.repository.backend_name())
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Builder for constructing GraphQLContext.
#[derive(Default)]
pub struct GraphQLContextBuilder {
    repository: Option<DynRepository>,
    request_id: Option<String>,
}

impl GraphQLContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the content repository.
    #[must_use]
    pub fn with_repository(mut self, repository: DynRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Builds the GraphQLContext.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<GraphQLContext, ContextBuilderError> {
        let repository = self
            .repository
            .ok_or(ContextBuilderError::MissingField("repository"))?;

        let request_id = self
            .request_id
            .ok_or(ContextBuilderError::MissingField("request_id"))?;

        Ok(GraphQLContext {
            repository,
            request_id,
        })
    }
}

/// Errors that can occur when building a GraphQLContext.
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
