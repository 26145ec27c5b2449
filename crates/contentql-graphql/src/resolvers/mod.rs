//! GraphQL resolvers over the content repository.
//!
//! - `nodes`: the implicit `Query.nodes(workspace, path)` root field
//! - `directive`: `Query` fields bound to `@definition` / `@delivery`
//! - `content`: fields of every other object type, read from the parent node
//! - `unresolvable`: `Query` fields with nothing to resolve them

mod content;
mod directive;
mod nodes;
mod unresolvable;

pub use content::ContentFieldResolver;
pub use directive::DirectiveResolver;
pub use nodes::NodesResolver;
pub use unresolvable::UnresolvableResolver;

use std::sync::Arc;

use async_graphql::dynamic::{FieldValue, ResolverContext};
use async_graphql::{Error as GraphQLFieldError, ErrorExtensions, Value};
use contentql_storage::{DynRepository, StorageError};
use tracing::warn;

use crate::content::ContentNode;
use crate::context::GraphQLContext;
use crate::error::GraphQLError;

/// Helper to extract GraphQL context from resolver context.
pub(crate) fn get_graphql_context<'a>(
    ctx: &'a ResolverContext<'_>,
) -> Result<&'a GraphQLContext, GraphQLFieldError> {
    ctx.data::<GraphQLContext>()
        .map_err(|_| GraphQLError::Internal("GraphQL context not available".into()).extend())
}

/// Reads the children of `workspace:path` as a list of content nodes.
///
/// Any repository failure becomes a field error with a `code` extension;
/// sibling fields keep resolving.
pub(crate) async fn children_field(
    ctx: &ResolverContext<'_>,
    workspace: &str,
    path: &str,
    node_types: Arc<[String]>,
) -> Result<FieldValue<'static>, GraphQLFieldError> {
    let gql_ctx = get_graphql_context(ctx)?;

    match read_children(&gql_ctx.repository, workspace, path, node_types).await {
        Ok(children) => Ok(node_list(children)),
        Err(e) => {
            warn!(
                request_id = %gql_ctx.request_id,
                workspace = %workspace,
                path = %path,
                category = %e.category(),
                error = %e,
                "Content repository error"
            );
            Err(GraphQLError::from(e).extend())
        }
    }
}

async fn read_children(
    repository: &DynRepository,
    workspace: &str,
    path: &str,
    node_types: Arc<[String]>,
) -> Result<Vec<ContentNode>, StorageError> {
    let root = ContentNode::open(repository, workspace, path, node_types).await?;
    Ok(root.children().await?.to_vec())
}

/// Wraps content nodes for the dynamic schema.
pub(crate) fn node_list(nodes: Vec<ContentNode>) -> FieldValue<'static> {
    FieldValue::list(nodes.into_iter().map(|node| FieldValue::owned_any(node)))
}

/// Convert a serde_json::Value to async_graphql::Value.
pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f)
                        .unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<async_graphql::Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (async_graphql::Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}
