//! Resolver directives.
//!
//! Two field directives turn a `Query` field into a content read:
//! - `@definition` - declared by hand in a definition file
//! - `@delivery` - synthesized from a delivery endpoint configuration
//!
//! Both take `(workspace: String!, rootPath: String, nodeTypes: [String])`
//! and resolve identically. The arguments are read once, when the schema is
//! built, into a [`DirectiveBinding`].

use std::sync::Arc;

use async_graphql_value::ConstValue;
use tracing::warn;

use super::fragment::FieldDef;

/// Directive and argument name constants.
pub mod names {
    pub const DEFINITION: &str = "definition";
    pub const DELIVERY: &str = "delivery";
    pub const WORKSPACE: &str = "workspace";
    pub const ROOT_PATH: &str = "rootPath";
    pub const NODE_TYPES: &str = "nodeTypes";
}

/// Default `rootPath`: the workspace root.
pub const DEFAULT_ROOT_PATH: &str = "/";

/// The recognized resolver directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// Hand-written field.
    Definition,
    /// Field synthesized from configuration.
    Delivery,
}

/// Lookup table, in priority order when a field carries both.
const RESOLVER_DIRECTIVES: &[(&str, DirectiveKind)] = &[
    (names::DEFINITION, DirectiveKind::Definition),
    (names::DELIVERY, DirectiveKind::Delivery),
];

impl DirectiveKind {
    pub fn name(self) -> &'static str {
        RESOLVER_DIRECTIVES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        RESOLVER_DIRECTIVES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        RESOLVER_DIRECTIVES.iter().map(|(_, kind)| *kind)
    }

    /// SDL declaration of this directive.
    pub fn declaration(self) -> String {
        format!(
            "directive @{}({}: String!, {}: String, {}: [String]) on FIELD_DEFINITION",
            self.name(),
            names::WORKSPACE,
            names::ROOT_PATH,
            names::NODE_TYPES
        )
    }
}

/// Arguments of a resolver directive, fixed at schema build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveBinding {
    pub kind: DirectiveKind,
    pub workspace: String,
    pub root_path: String,
    /// Allowed primary types; empty means no filtering.
    pub node_types: Arc<[String]>,
}

impl DirectiveBinding {
    /// Binds the first recognized resolver directive on a field.
    ///
    /// Returns `None` when the field carries no resolver directive, or when
    /// the directive lacks a string `workspace` argument. The latter is logged
    /// and leaves the field unresolvable.
    pub fn from_field(type_name: &str, field: &FieldDef) -> Option<Self> {
        let (kind, directive) = RESOLVER_DIRECTIVES
            .iter()
            .find_map(|(name, kind)| field.directive(name).map(|d| (*kind, d)))?;

        let Some(ConstValue::String(workspace)) = directive.argument(names::WORKSPACE) else {
            warn!(
                type_name = %type_name,
                field = %field.name,
                directive = kind.name(),
                "Directive has no workspace argument, field stays unresolvable"
            );
            return None;
        };

        let root_path = match directive.argument(names::ROOT_PATH) {
            None | Some(ConstValue::Null) => DEFAULT_ROOT_PATH.to_string(),
            Some(ConstValue::String(path)) => path.clone(),
            Some(other) => {
                warn!(
                    field = %field.name,
                    value = %other,
                    "Ignoring non-string rootPath"
                );
                DEFAULT_ROOT_PATH.to_string()
            }
        };

        let node_types: Vec<String> = match directive.argument(names::NODE_TYPES) {
            None | Some(ConstValue::Null) => Vec::new(),
            Some(ConstValue::String(node_type)) => vec![node_type.clone()],
            Some(ConstValue::List(items)) => items
                .iter()
                .filter_map(|item| match item {
                    ConstValue::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            Some(other) => {
                warn!(
                    field = %field.name,
                    value = %other,
                    "Ignoring malformed nodeTypes"
                );
                Vec::new()
            }
        };

        Some(Self {
            kind,
            workspace: workspace.clone(),
            root_path,
            node_types: node_types.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fragment::TypeRegistry;

    fn query_field(sdl: &str, name: &str) -> FieldDef {
        TypeRegistry::parse(sdl)
            .unwrap()
            .object("Query")
            .unwrap()
            .field(name)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(DirectiveKind::from_name("definition"), Some(DirectiveKind::Definition));
        assert_eq!(DirectiveKind::from_name("delivery"), Some(DirectiveKind::Delivery));
        assert_eq!(DirectiveKind::from_name("deprecated"), None);
        assert_eq!(DirectiveKind::Delivery.name(), "delivery");
        assert_eq!(DirectiveKind::all().count(), 2);
    }

    #[test]
    fn test_declaration_parses() {
        for kind in DirectiveKind::all() {
            let registry = TypeRegistry::parse(&kind.declaration()).unwrap();
            assert!(registry.declares_directive(kind.name()));
        }
    }

    #[test]
    fn test_bind_all_arguments() {
        let field = query_field(
            r#"type Query { pages: [Node] @definition(workspace: "site", rootPath: "/a", nodeTypes: ["mgnl:page", "mgnl:area"]) }"#,
            "pages",
        );

        let binding = DirectiveBinding::from_field("Query", &field).unwrap();
        assert_eq!(binding.kind, DirectiveKind::Definition);
        assert_eq!(binding.workspace, "site");
        assert_eq!(binding.root_path, "/a");
        assert_eq!(&*binding.node_types, ["mgnl:page".to_string(), "mgnl:area".to_string()]);
    }

    #[test]
    fn test_bind_defaults() {
        let field = query_field(
            r#"type Query { all: [Node] @delivery(workspace: "site") }"#,
            "all",
        );

        let binding = DirectiveBinding::from_field("Query", &field).unwrap();
        assert_eq!(binding.kind, DirectiveKind::Delivery);
        assert_eq!(binding.root_path, "/");
        assert!(binding.node_types.is_empty());
    }

    #[test]
    fn test_bind_single_node_type() {
        let field = query_field(
            r#"type Query { pages: [Node] @delivery(workspace: "site", nodeTypes: "mgnl:page") }"#,
            "pages",
        );

        let binding = DirectiveBinding::from_field("Query", &field).unwrap();
        assert_eq!(&*binding.node_types, ["mgnl:page".to_string()]);
    }

    #[test]
    fn test_missing_workspace_is_unbound() {
        let field = query_field(
            r#"type Query { pages: [Node] @definition(rootPath: "/a") }"#,
            "pages",
        );
        assert!(DirectiveBinding::from_field("Query", &field).is_none());
    }

    #[test]
    fn test_unrelated_directive_is_unbound() {
        let field = query_field(
            r#"type Query { old: String @deprecated(reason: "gone") }"#,
            "old",
        );
        assert!(DirectiveBinding::from_field("Query", &field).is_none());
    }

    #[test]
    fn test_definition_wins_over_delivery() {
        let field = query_field(
            r#"type Query { both: [Node] @delivery(workspace: "b") @definition(workspace: "a") }"#,
            "both",
        );

        let binding = DirectiveBinding::from_field("Query", &field).unwrap();
        assert_eq!(binding.kind, DirectiveKind::Definition);
        assert_eq!(binding.workspace, "a");
    }
}
