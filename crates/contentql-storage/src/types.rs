//! Node and property types returned by content repositories.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single node read from a content repository.
///
/// Nodes are plain data. They carry no handle back to the session that
/// produced them, so traversal always goes through [`crate::ContentSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredNode {
    /// Last path segment. Empty for the workspace root.
    pub name: String,
    /// Absolute path within the workspace.
    pub path: String,
    /// Primary node type, e.g. `mgnl:page`.
    pub primary_type: String,
    /// Properties in store order.
    #[serde(default)]
    pub properties: Vec<NodeProperty>,
}

impl StoredNode {
    /// Creates a node without properties.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        primary_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            primary_type: primary_type.into(),
            properties: Vec::new(),
        }
    }

    /// Adds a property, builder style.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.push(NodeProperty::new(name, value));
        self
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A named property value on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProperty {
    pub name: String,
    pub value: Value,
}

impl NodeProperty {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// String rendition of the value.
    ///
    /// Strings are returned as-is, scalars use their JSON text, arrays join
    /// their elements with `,`. Returns `None` for `null`.
    pub fn as_string(&self) -> Option<String> {
        value_to_string(&self.value)
    }

    /// Name of the property type, in the vocabulary of the content store.
    pub fn type_name(&self) -> &'static str {
        match &self.value {
            Value::Null => "Undefined",
            Value::Bool(_) => "Boolean",
            Value::Number(n) if n.is_f64() => "Double",
            Value::Number(_) => "Long",
            Value::String(_) => "String",
            Value::Array(_) => "Multiple",
            Value::Object(_) => "Binary",
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}
