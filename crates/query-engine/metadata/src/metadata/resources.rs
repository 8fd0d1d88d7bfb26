//! Metadata information regarding the queryable resources and their relations.

use std::collections::BTreeSet;

use enum_iterator::Sequence;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The semantic types a resource field can have.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Timestamp,
    Identifier,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Timestamp => write!(f, "timestamp"),
            FieldType::Identifier => write!(f, "identifier"),
        }
    }
}

/// Information about a single field of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldInfo {
    pub r#type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldInfo {
    pub fn new(r#type: FieldType, description: &str) -> FieldInfo {
        FieldInfo {
            r#type,
            description: Some(description.to_string()),
        }
    }
}

/// How a relation is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

/// A directed, named edge from the owning resource to a target resource.
/// Relations are only ever traversed one hop, from the resource that declares them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelationInfo {
    #[serde(default)]
    pub kind: JoinKind,
    /// Field on the owning resource.
    pub local_field: String,
    /// Name of the resource the relation points to.
    pub target_resource: String,
    /// Field on the target resource.
    pub target_field: String,
    /// Table alias used for the target in generated SQL.
    pub alias: String,
}

/// Information about a queryable resource, backed by a view or table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub view: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text names which resolve to this resource.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    pub fields: IndexMap<String, FieldInfo>,
    /// Fields returned when a plan does not ask for any.
    #[serde(default)]
    pub default_select: Vec<String>,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub relations: IndexMap<String, RelationInfo>,
}

impl ResourceInfo {
    /// The set of field names of this resource.
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// Mapping from a canonical resource name to its information.
/// Declaration order is kept so that descriptions and diagnostics are stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Resources(pub IndexMap<String, ResourceInfo>);

impl Resources {
    pub fn empty() -> Self {
        Resources(IndexMap::new())
    }
}
