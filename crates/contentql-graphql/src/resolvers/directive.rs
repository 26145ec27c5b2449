//! Directive-bound field resolver.

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use tracing::debug;

use super::children_field;
use crate::schema::DirectiveBinding;

/// Resolver for `Query` fields carrying `@definition` or `@delivery`.
pub struct DirectiveResolver;

impl DirectiveResolver {
    /// Creates a resolver closed over the binding.
    ///
    /// The binding is fixed at schema build time; request arguments of the
    /// field are not consulted.
    pub fn resolve(
        binding: DirectiveBinding,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let binding = binding.clone();
            FieldFuture::new(async move {
                debug!(
                    field = %ctx.field().name(),
                    directive = binding.kind.name(),
                    workspace = %binding.workspace,
                    root_path = %binding.root_path,
                    node_types = ?binding.node_types,
                    "Resolving directive field"
                );

                let value = children_field(
                    &ctx,
                    &binding.workspace,
                    &binding.root_path,
                    binding.node_types.clone(),
                )
                .await?;
                Ok(Some(value))
            })
        }
    }
}
