//! Implicit root field resolver.
//!
//! `nodes(workspace: String!, path: String): [Node]` lists the unfiltered
//! children of any node. Its arguments are read per call.

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use tracing::debug;

use super::children_field;
use crate::schema::DEFAULT_ROOT_PATH;

/// Resolver for `Query.nodes`.
pub struct NodesResolver;

impl NodesResolver {
    /// Creates the resolver function for the implicit root field.
    pub fn resolve() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            FieldFuture::new(async move {
                let workspace = ctx
                    .args
                    .get("workspace")
                    .and_then(|v| v.string().ok())
                    .ok_or_else(|| {
                        async_graphql::Error::new("Missing required argument 'workspace'")
                    })?
                    .to_string();
                let path = ctx
                    .args
                    .get("path")
                    .and_then(|v| v.string().ok())
                    .unwrap_or(DEFAULT_ROOT_PATH)
                    .to_string();

                debug!(workspace = %workspace, path = %path, "Resolving nodes");

                let value =
                    children_field(&ctx, &workspace, &path, Vec::<String>::new().into()).await?;
                Ok(Some(value))
            })
        }
    }
}
