//! Schema composition and publication.
//!
//! The schema is never edited in place. Every rebuild starts from an empty
//! registry and produces a complete new snapshot that replaces the published
//! one atomically.
//!
//! ## Components
//!
//! - [`TypeRegistry`] - Structured view of parsed SDL fragments
//! - [`merge()`] - Folds one fragment into a registry
//! - [`synthetic`] - SDL generated from delivery endpoint configuration
//! - [`ContentSchemaBuilder`] - Runs the whole pipeline and compiles
//! - [`LiveSchema`] - Holds the published [`SchemaSnapshot`]
//!
//! ## Architecture
//!
//! One rebuild:
//! 1. Parse the core fragment (`Query.nodes`, `Node`, `Property`)
//! 2. Merge each valid definition fragment in registration order
//! 3. Synthesize and merge one `Query` field per delivery endpoint
//! 4. Bind a resolver to every field and compile
//! 5. Publish the snapshot

mod builder;
mod compiler;
pub mod core;
pub mod directives;
pub(crate) mod fragment;
mod live;
pub mod merge;
pub mod synthetic;

pub use builder::{ContentSchemaBuilder, SchemaBuilderConfig};
pub use compiler::compile;
pub use directives::{DEFAULT_ROOT_PATH, DirectiveBinding, DirectiveKind};
pub use fragment::{
    ArgumentDef, DirectiveApplication, DirectiveDecl, EnumTypeDef, FieldDef, ObjectTypeDef,
    SchemaFragment, TypeExpr, TypeRegistry,
};
pub use live::{LiveSchema, SchemaSnapshot, SchemaState, SourcedFragment};
pub use merge::merge;
