//! Content schema builder.
//!
//! One build runs the whole pipeline from an empty registry: parse the core
//! fragment, merge every definition fragment in the given order, synthesize
//! and merge one fragment per delivery endpoint, then compile.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use tracing::{debug, trace, warn};

use super::compiler::compile;
use super::core::{CORE_SDL, NODE_TYPE, QUERY_TYPE};
use super::fragment::TypeRegistry;
use super::merge::merge;
use super::synthetic::synthesize;
use crate::config::DeliveryEndpoint;
use crate::error::GraphQLError;

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            introspection_enabled: true,
        }
    }
}

/// Builds executable schemas from fragments.
///
/// # Example
///
/// ```ignore
/// let builder = ContentSchemaBuilder::new(SchemaBuilderConfig::default())
///     .with_delivery(config.delivery.clone());
///
/// let (registry, schema) = builder.build(fragments.iter().map(|f| f.as_ref()))?;
/// ```
#[derive(Debug, Clone)]
pub struct ContentSchemaBuilder {
    config: SchemaBuilderConfig,
    core_sdl: Arc<str>,
    delivery: Vec<DeliveryEndpoint>,
}

impl ContentSchemaBuilder {
    /// Creates a builder starting from the built-in core fragment.
    #[must_use]
    pub fn new(config: SchemaBuilderConfig) -> Self {
        Self {
            config,
            core_sdl: Arc::from(CORE_SDL),
            delivery: Vec::new(),
        }
    }

    /// Replaces the core fragment.
    #[must_use]
    pub fn with_core_sdl(mut self, sdl: impl Into<Arc<str>>) -> Self {
        self.core_sdl = sdl.into();
        self
    }

    /// Sets the delivery endpoints synthesized into every build.
    #[must_use]
    pub fn with_delivery(mut self, delivery: Vec<DeliveryEndpoint>) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn delivery(&self) -> &[DeliveryEndpoint] {
        &self.delivery
    }

    /// Merges the core fragment, `fragments` and the delivery fields.
    ///
    /// Delivery fields are skipped when the merged registry lacks `Query` or
    /// `Node`. A synthesized fragment that fails to parse is skipped alone.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaBuildFailed` if the core fragment is not
    /// valid SDL.
    pub fn assemble<'a>(
        &self,
        fragments: impl IntoIterator<Item = &'a TypeRegistry>,
    ) -> Result<TypeRegistry, GraphQLError> {
        let mut registry = TypeRegistry::parse(&self.core_sdl)
            .map_err(|e| GraphQLError::SchemaBuildFailed(format!("core fragment: {e}")))?;

        let mut merged = 0usize;
        for fragment in fragments {
            merge(fragment.clone(), &mut registry);
            merged += 1;
        }
        trace!(fragments = merged, "Merged definition fragments");

        if self.delivery.is_empty() {
            return Ok(registry);
        }

        let missing: Vec<&str> = [QUERY_TYPE, NODE_TYPE]
            .into_iter()
            .filter(|name| registry.object(name).is_none())
            .collect();
        if !missing.is_empty() {
            warn!(
                missing = ?missing,
                skipped = self.delivery.len(),
                "Core types missing, delivery fields skipped"
            );
            return Ok(registry);
        }

        for endpoint in &self.delivery {
            let sdl = synthesize(endpoint, &registry);
            match TypeRegistry::parse(&sdl) {
                Ok(fragment) => {
                    debug!(endpoint = %endpoint.name, workspace = %endpoint.workspace, "Merged delivery field");
                    merge(fragment, &mut registry);
                }
                Err(e) => {
                    warn!(endpoint = %endpoint.name, error = %e, "Skipping delivery endpoint");
                }
            }
        }

        Ok(registry)
    }

    /// Assembles and compiles.
    ///
    /// # Errors
    ///
    /// See [`ContentSchemaBuilder::assemble`] and [`compile`].
    pub fn build<'a>(
        &self,
        fragments: impl IntoIterator<Item = &'a TypeRegistry>,
    ) -> Result<(TypeRegistry, Schema), GraphQLError> {
        debug!("Starting GraphQL schema build");
        let registry = self.assemble(fragments)?;
        let schema = compile(&registry, &self.config)?;
        debug!(
            types = registry.objects().count(),
            "GraphQL schema build complete"
        );
        Ok((registry, schema))
    }
}
