//! Structured type registry parsed from SDL fragments.
//!
//! Only the parts of a fragment that the engine acts on are kept: object
//! types with their fields, arguments and applied directives, scalar and enum
//! declarations, and the names and arguments of directive declarations.
//! Interfaces, unions and input objects are skipped.

use std::fmt;

use async_graphql::dynamic::TypeRef;
use async_graphql_parser::types::{
    BaseType, ConstDirective, FieldDefinition, InputValueDefinition, Type, TypeKind,
    TypeSystemDefinition,
};
use async_graphql_parser::Positioned;
use async_graphql_value::ConstValue;
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::GraphQLError;

/// A parsed fragment is a registry that has not been merged anywhere yet.
pub type SchemaFragment = TypeRegistry;

/// Named type definitions accumulated from one or more fragments.
///
/// At most one object type exists per name. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRegistry {
    pub(crate) objects: IndexMap<String, ObjectTypeDef>,
    pub(crate) scalars: IndexSet<String>,
    pub(crate) enums: IndexMap<String, EnumTypeDef>,
    pub(crate) directives: IndexMap<String, DirectiveDecl>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one SDL text into a fresh registry.
    ///
    /// Type definitions and extensions of the same name inside one document
    /// are combined with the merge rule. A document holding only comments is
    /// an empty fragment.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::InvalidSdl` when the text is not valid SDL.
    pub fn parse(sdl: &str) -> Result<Self, GraphQLError> {
        let mut registry = Self::new();
        if is_blank(sdl) {
            return Ok(registry);
        }

        let document = async_graphql_parser::parse_schema(sdl)
            .map_err(|e| GraphQLError::InvalidSdl(e.to_string()))?;

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Type(ty) => {
                    let ty = ty.node;
                    let name = ty.name.node.to_string();
                    match ty.kind {
                        TypeKind::Object(object) => {
                            let fields = object.fields.iter().map(field_from_ast).collect();
                            super::merge::merge_object(
                                &mut registry,
                                ObjectTypeDef { name, fields },
                            );
                        }
                        TypeKind::Scalar => {
                            registry.scalars.insert(name);
                        }
                        TypeKind::Enum(enum_type) => {
                            let values = enum_type
                                .values
                                .iter()
                                .map(|v| v.node.value.node.to_string())
                                .collect();
                            super::merge::merge_enum(&mut registry, EnumTypeDef { name, values });
                        }
                        _ => {
                            debug!(type_name = %name, "Skipping unsupported type definition");
                        }
                    }
                }
                TypeSystemDefinition::Directive(directive) => {
                    let directive = directive.node;
                    let name = directive.name.node.to_string();
                    let arguments = directive.arguments.iter().map(argument_from_ast).collect();
                    registry
                        .directives
                        .entry(name.clone())
                        .or_insert(DirectiveDecl { name, arguments });
                }
                TypeSystemDefinition::Schema(_) => {
                    debug!("Ignoring schema definition, root types are fixed");
                }
            }
        }

        Ok(registry)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectTypeDef> {
        self.objects.get(name)
    }

    /// Object types in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectTypeDef> {
        self.objects.values()
    }

    pub fn scalars(&self) -> impl Iterator<Item = &str> {
        self.scalars.iter().map(String::as_str)
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumTypeDef> {
        self.enums.values()
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDecl> {
        self.directives.get(name)
    }

    /// Whether a directive of this name is declared.
    pub fn declares_directive(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// Whether any object, scalar or enum type of this name exists.
    pub fn has_type(&self, name: &str) -> bool {
        self.objects.contains_key(name)
            || self.scalars.contains(name)
            || self.enums.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
            && self.scalars.is_empty()
            && self.enums.is_empty()
            && self.directives.is_empty()
    }
}

/// An object type and its fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTypeDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl ObjectTypeDef {
    /// First field of this name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub arguments: Vec<ArgumentDef>,
    pub ty: TypeExpr,
    pub directives: Vec<DirectiveApplication>,
}

impl FieldDef {
    /// First application of the named directive.
    pub fn directive(&self, name: &str) -> Option<&DirectiveApplication> {
        self.directives.iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: TypeExpr,
    pub default_value: Option<ConstValue>,
}

/// A directive applied to a field, with its literal arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveApplication {
    pub name: String,
    pub arguments: IndexMap<String, ConstValue>,
}

impl DirectiveApplication {
    pub fn argument(&self, name: &str) -> Option<&ConstValue> {
        self.arguments.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumTypeDef {
    pub name: String,
    pub values: Vec<String>,
}

/// A `directive @name(...)` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDecl {
    pub name: String,
    pub arguments: Vec<ArgumentDef>,
}

/// A field or argument type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

impl TypeExpr {
    /// Innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }

    /// Whether the value is a list at the outermost level, ignoring non-null.
    pub fn is_list(&self) -> bool {
        match self {
            Self::Named(_) => false,
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
        }
    }

    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            Self::Named(name) => TypeRef::named(name.clone()),
            Self::List(inner) => TypeRef::List(Box::new(inner.to_type_ref())),
            Self::NonNull(inner) => TypeRef::NonNull(Box::new(inner.to_type_ref())),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl From<&Type> for TypeExpr {
    fn from(ty: &Type) -> Self {
        let base = match &ty.base {
            BaseType::Named(name) => Self::Named(name.to_string()),
            BaseType::List(inner) => Self::List(Box::new(Self::from(inner.as_ref()))),
        };
        if ty.nullable {
            base
        } else {
            Self::NonNull(Box::new(base))
        }
    }
}

fn field_from_ast(field: &Positioned<FieldDefinition>) -> FieldDef {
    let field = &field.node;
    FieldDef {
        name: field.name.node.to_string(),
        arguments: field.arguments.iter().map(argument_from_ast).collect(),
        ty: TypeExpr::from(&field.ty.node),
        directives: field.directives.iter().map(directive_from_ast).collect(),
    }
}

fn argument_from_ast(argument: &Positioned<InputValueDefinition>) -> ArgumentDef {
    let argument = &argument.node;
    ArgumentDef {
        name: argument.name.node.to_string(),
        ty: TypeExpr::from(&argument.ty.node),
        default_value: argument.default_value.as_ref().map(|v| v.node.clone()),
    }
}

fn directive_from_ast(directive: &Positioned<ConstDirective>) -> DirectiveApplication {
    let directive = &directive.node;
    DirectiveApplication {
        name: directive.name.node.to_string(),
        arguments: directive
            .arguments
            .iter()
            .map(|(name, value)| (name.node.to_string(), value.node.clone()))
            .collect(),
    }
}

fn is_blank(sdl: &str) -> bool {
    sdl.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}
