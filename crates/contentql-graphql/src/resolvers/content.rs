//! Field resolver for object types below `Query`.
//!
//! Parents are [`ContentNode`]s or [`ContentProperty`]s. Node fields map to
//! the structured accessors (`name`, `path`, `nodeType`, `properties`,
//! `children`); any other name reads the node property of that name.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::{ErrorExtensions, Value};

use super::{json_to_graphql_value, node_list};
use crate::content::{ContentNode, ContentProperty, NodeField, NodeValue};
use crate::error::GraphQLError;
use crate::schema::TypeExpr;

/// How a declared field type wants its value.
#[derive(Debug, Clone, Copy)]
struct FieldShape {
    /// The base type is an object type.
    object: bool,
    /// The base type is `String` or `ID`.
    text: bool,
    list: bool,
}

/// Resolver for fields of content object types.
pub struct ContentFieldResolver;

impl ContentFieldResolver {
    /// Creates a resolver for `field_name` declared with type `ty`.
    ///
    /// `object` tells whether the base type of `ty` is an object type.
    pub fn resolve(
        field_name: String,
        ty: TypeExpr,
        object: bool,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        let field = NodeField::from_name(&field_name);
        let shape = FieldShape {
            object,
            text: matches!(ty.base_name(), "String" | "ID"),
            list: ty.is_list(),
        };

        move |ctx| {
            let field = field.clone();
            let field_name = field_name.clone();
            FieldFuture::new(async move {
                if let Ok(node) = ctx.parent_value.try_downcast_ref::<ContentNode>() {
                    let value = node
                        .field(&field)
                        .await
                        .map_err(|e| GraphQLError::from(e).extend())?;
                    return Ok(shape.node_value(value));
                }

                if let Ok(property) = ctx.parent_value.try_downcast_ref::<ContentProperty>() {
                    return Ok(property_field(property, &field_name));
                }

                Err(GraphQLError::Internal(format!(
                    "field {field_name} has no content parent"
                ))
                .extend())
            })
        }
    }
}

impl FieldShape {
    fn node_value(self, value: NodeValue) -> Option<FieldValue<'static>> {
        match value {
            NodeValue::Text(text) => text.map(|s| FieldValue::value(Value::String(s))),
            NodeValue::Properties(properties) => Some(FieldValue::list(
                properties.into_iter().map(|p| FieldValue::owned_any(p)),
            )),
            NodeValue::Nodes(nodes) => Some(node_list(nodes)),
            NodeValue::Property(None) => None,
            NodeValue::Property(Some(property)) => self.property_value(property),
        }
    }

    /// Shapes a node property read through a custom field name.
    fn property_value(self, property: ContentProperty) -> Option<FieldValue<'static>> {
        if self.object {
            return Some(FieldValue::owned_any(property));
        }

        let value = match (self.text, self.list, property.value()) {
            (_, _, serde_json::Value::Null) => return None,
            (true, true, serde_json::Value::Array(items)) => Value::List(
                items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => Value::String(s.clone()),
                        other => Value::String(other.to_string()),
                    })
                    .collect(),
            ),
            (true, true, _) => {
                Value::List(property.string().map(Value::String).into_iter().collect())
            }
            (true, false, _) => Value::String(property.string()?),
            (false, true, serde_json::Value::Array(_)) => {
                json_to_graphql_value(property.value().clone())
            }
            (false, true, other) => Value::List(vec![json_to_graphql_value(other.clone())]),
            (false, false, other) => json_to_graphql_value(other.clone()),
        };
        Some(FieldValue::value(value))
    }
}

fn property_field(property: &ContentProperty, field_name: &str) -> Option<FieldValue<'static>> {
    let value = match field_name {
        "name" => Value::String(property.name().to_string()),
        "string" => Value::String(property.string()?),
        "type" => Value::String(property.type_name().to_string()),
        _ => return None,
    };
    Some(FieldValue::value(value))
}
