//! Compiles a merged [`TypeRegistry`] into an executable dynamic schema.
//!
//! - `Query.nodes` is wired to the implicit root resolver
//! - other `Query` fields get a directive-bound resolver, or one that reports
//!   the field as not resolvable
//! - fields of every other object type read from the parent content node
//!
//! Fields referring to types the registry does not define are dropped with a
//! warning. Duplicate field names are collapsed, the last definition wins.

use std::collections::HashSet;

use async_graphql::dynamic::{Enum, EnumItem, Field, InputValue, Object, Scalar, Schema};
use indexmap::IndexMap;
use tracing::{debug, warn};

use super::builder::SchemaBuilderConfig;
use super::core::{NODES_FIELD, QUERY_TYPE};
use super::directives::DirectiveBinding;
use super::fragment::{ArgumentDef, FieldDef, ObjectTypeDef, TypeRegistry};
use crate::error::GraphQLError;
use crate::resolvers::{
    ContentFieldResolver, DirectiveResolver, NodesResolver, UnresolvableResolver,
};

const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

/// Builds the executable schema for a registry.
///
/// # Errors
///
/// Returns `GraphQLError::SchemaBuildFailed` if the registry has no `Query`
/// type or the resulting schema is rejected by the engine.
pub fn compile(
    registry: &TypeRegistry,
    config: &SchemaBuilderConfig,
) -> Result<Schema, GraphQLError> {
    if registry.object(QUERY_TYPE).is_none() {
        return Err(GraphQLError::SchemaBuildFailed(format!(
            "type {QUERY_TYPE} is not defined"
        )));
    }

    let known = known_types(registry);
    let mut builder = Schema::build(QUERY_TYPE, None, None);

    for scalar in registry.scalars() {
        if !BUILTIN_SCALARS.contains(&scalar) {
            builder = builder.register(Scalar::new(scalar));
        }
    }

    for enum_type in registry.enums() {
        let items = enum_type.values.iter().map(|v| EnumItem::new(v.as_str()));
        builder = builder.register(Enum::new(enum_type.name.as_str()).items(items));
    }

    for object in registry.objects() {
        if object.name == QUERY_TYPE {
            builder = builder.register(query_object(object, &known));
        } else if let Some(content) = content_object(object, registry, &known) {
            builder = builder.register(content);
        }
    }

    if !config.introspection_enabled {
        builder = builder.disable_introspection();
    }

    builder
        .finish()
        .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))
}

fn query_object(object: &ObjectTypeDef, known: &HashSet<&str>) -> Object {
    let mut query = Object::new(object.name.as_str());

    for field in unique_fields(object, known) {
        if field.name == NODES_FIELD {
            let graphql_field = Field::new(
                field.name.as_str(),
                field.ty.to_type_ref(),
                NodesResolver::resolve(),
            );
            query = query.field(with_arguments(graphql_field, &field.arguments));
            continue;
        }

        let graphql_field = match DirectiveBinding::from_field(&object.name, field) {
            Some(binding) => {
                debug!(
                    field = %field.name,
                    directive = binding.kind.name(),
                    workspace = %binding.workspace,
                    "Binding directive resolver"
                );
                Field::new(
                    field.name.as_str(),
                    field.ty.to_type_ref(),
                    DirectiveResolver::resolve(binding),
                )
            }
            None => Field::new(
                field.name.as_str(),
                field.ty.to_type_ref(),
                UnresolvableResolver::resolve(object.name.clone(), field.name.clone()),
            ),
        };
        query = query.field(with_arguments(graphql_field, &field.arguments));
    }

    query
}

fn content_object(
    object: &ObjectTypeDef,
    registry: &TypeRegistry,
    known: &HashSet<&str>,
) -> Option<Object> {
    let fields = unique_fields(object, known);
    if fields.is_empty() {
        warn!(type_name = %object.name, "Skipping object type without fields");
        return None;
    }

    let mut content = Object::new(object.name.as_str());
    for field in fields {
        let is_object = registry.object(field.ty.base_name()).is_some();
        let graphql_field = Field::new(
            field.name.as_str(),
            field.ty.to_type_ref(),
            ContentFieldResolver::resolve(field.name.clone(), field.ty.clone(), is_object),
        );
        content = content.field(with_arguments(graphql_field, &field.arguments));
    }

    Some(content)
}

fn with_arguments(mut field: Field, arguments: &[ArgumentDef]) -> Field {
    for argument in arguments {
        let mut input = InputValue::new(argument.name.as_str(), argument.ty.to_type_ref());
        if let Some(default) = &argument.default_value {
            input = input.default_value(default.clone());
        }
        field = field.argument(input);
    }
    field
}

/// Fields of `object` whose types all exist, deduplicated by name.
fn unique_fields<'a>(object: &'a ObjectTypeDef, known: &HashSet<&str>) -> Vec<&'a FieldDef> {
    let mut fields: IndexMap<&str, &FieldDef> = IndexMap::new();

    for field in &object.fields {
        let missing = std::iter::once(&field.ty)
            .chain(field.arguments.iter().map(|a| &a.ty))
            .map(|ty| ty.base_name())
            .find(|name| !known.contains(name));
        if let Some(missing) = missing {
            warn!(
                type_name = %object.name,
                field = %field.name,
                missing_type = %missing,
                "Dropping field referring to an undefined type"
            );
            continue;
        }

        if fields.insert(field.name.as_str(), field).is_some() {
            warn!(
                type_name = %object.name,
                field = %field.name,
                "Duplicate field definition, the last one wins"
            );
        }
    }

    fields.into_values().collect()
}

fn known_types(registry: &TypeRegistry) -> HashSet<&str> {
    BUILTIN_SCALARS
        .iter()
        .copied()
        .chain(registry.scalars())
        .chain(registry.enums().map(|e| e.name.as_str()))
        .chain(
            registry
                .objects()
                .filter(|o| !o.fields.is_empty())
                .map(|o| o.name.as_str()),
        )
        .collect()
}
