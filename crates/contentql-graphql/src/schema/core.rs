//! Built-in core fragment.
//!
//! Declares the root `Query` with the implicit `nodes` field, the generic
//! `Node` and `Property` types and both resolver directives. Every rebuild
//! starts from this fragment unless a replacement SDL file is configured.

/// Root query type name.
pub const QUERY_TYPE: &str = "Query";

/// Generic content node type name.
pub const NODE_TYPE: &str = "Node";

/// Node property type name.
pub const PROPERTY_TYPE: &str = "Property";

/// The implicit root field, always wired.
pub const NODES_FIELD: &str = "nodes";

pub const CORE_SDL: &str = r#"
directive @definition(workspace: String!, rootPath: String, nodeTypes: [String]) on FIELD_DEFINITION
directive @delivery(workspace: String!, rootPath: String, nodeTypes: [String]) on FIELD_DEFINITION

type Query {
  nodes(workspace: String!, path: String): [Node]
}

type Node {
  name: String
  path: String
  nodeType: String
  properties: [Property]
  children: [Node]
}

type Property {
  name: String
  string: String
  type: String
}
"#;
