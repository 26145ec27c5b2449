//! SDL fragments synthesized from delivery endpoint configuration.
//!
//! Each [`DeliveryEndpoint`] becomes an `extend type Query` fragment with a
//! single `@delivery` field. The text goes through the same parse and merge
//! path as a hand-written definition file.

use std::fmt::Write;

use async_graphql_value::ConstValue;

use super::core::{NODE_TYPE, QUERY_TYPE};
use super::directives::{names, DirectiveKind};
use super::fragment::TypeRegistry;
use crate::config::DeliveryEndpoint;

/// Turns an endpoint name into a GraphQL field name.
///
/// Path separators and other characters outside `[A-Za-z0-9_]` become `_`;
/// a leading digit gets a `_` prefix.
pub fn field_name(endpoint_name: &str) -> String {
    let mut name: String = endpoint_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Builds the SDL fragment for one endpoint.
///
/// The `@delivery` declaration is emitted only when `declared` does not
/// already contain it. `rootPath` and `nodeTypes` are omitted when unset.
pub fn synthesize(endpoint: &DeliveryEndpoint, declared: &TypeRegistry) -> String {
    let kind = DirectiveKind::Delivery;
    let mut sdl = String::new();

    if !declared.declares_directive(kind.name()) {
        sdl.push_str(&kind.declaration());
        sdl.push_str("\n\n");
    }

    let mut arguments = vec![format!(
        "{}: {}",
        names::WORKSPACE,
        literal(&endpoint.workspace)
    )];
    if let Some(root_path) = endpoint.root_path.as_deref().filter(|p| !p.is_empty()) {
        arguments.push(format!("{}: {}", names::ROOT_PATH, literal(root_path)));
    }
    if !endpoint.node_types.is_empty() {
        let node_types = endpoint
            .node_types
            .iter()
            .map(|t| literal(t))
            .collect::<Vec<_>>()
            .join(", ");
        arguments.push(format!("{}: [{node_types}]", names::NODE_TYPES));
    }

    let _ = writeln!(sdl, "extend type {QUERY_TYPE} {{");
    let _ = writeln!(
        sdl,
        "  {}: [{NODE_TYPE}] @{}({})",
        field_name(&endpoint.name),
        kind.name(),
        arguments.join(", ")
    );
    sdl.push_str("}\n");
    sdl
}

fn literal(value: &str) -> String {
    ConstValue::String(value.to_string()).to_string()
}
