use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::ErrorExtensions;

use crate::error::GraphQLError;

/// Resolver for `Query` fields without a recognized directive.
///
/// The field stays in the schema; requesting it yields a field error.
pub struct UnresolvableResolver;

impl UnresolvableResolver {
    pub fn resolve(
        type_name: String,
        field: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |_ctx| {
            let err = GraphQLError::FieldNotResolvable {
                type_name: type_name.clone(),
                field: field.clone(),
            };
            FieldFuture::new(async move { Err::<Option<async_graphql::Value>, _>(err.extend()) })
        }
    }
}
