use std::collections::BTreeMap;

use serde_json::Value;

/// In-memory view of an OpenAPI document, as produced by the loader.
///
/// Component schemas keep `$ref` pointers as name-only references
/// (`#/components/schemas/Name`); nothing is inlined, so a cyclic component
/// graph stays a finite tree of owned values.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub title: String,
    pub version: String,
    pub description: String,
    pub servers: Vec<Server>,
    pub tags: Vec<Tag>,
    pub paths: Vec<PathItem>,
    /// Key: schema name as it appears under `components.schemas`.
    pub components: BTreeMap<String, Schema>,
}

impl Document {
    pub fn tag_description(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.description.as_str())
            .filter(|d| !d.is_empty())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Server {
    pub url: String,
    pub description: String,
}

#[derive(Clone, Debug, Default)]
pub struct Tag {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Default)]
pub struct PathItem {
    pub path: String,
    pub operations: Vec<Operation>,
}

#[derive(Clone, Debug, Default)]
pub struct Operation {
    /// Upper-case HTTP method (`GET`, `POST`, ...).
    pub method: String,
    pub summary: String,
    pub description: String,
    pub operation_id: String,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub responses: Vec<Response>,
}

#[derive(Clone, Debug, Default)]
pub struct Parameter {
    pub name: String,
    /// `query`, `path`, `header` or `cookie`.
    pub location: String,
    pub description: String,
    pub required: bool,
    pub schema: Schema,
}

#[derive(Clone, Debug, Default)]
pub struct RequestBody {
    pub description: String,
    pub required: bool,
    /// Key: media type, e.g. `application/json`.
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Clone, Debug, Default)]
pub struct MediaType {
    pub schema: Schema,
    pub example: Option<Value>,
    pub examples: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default)]
pub struct Response {
    pub status_code: String,
    pub description: String,
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub schema_type: String,
    pub format: String,
    pub description: String,
    pub properties: BTreeMap<String, Schema>,
    pub items: Option<Box<Schema>>,
    /// Raw `$ref` pointer, empty when the schema is inline.
    pub reference: String,
}

impl Schema {
    pub fn named(reference: &str) -> Self {
        Schema {
            reference: reference.to_string(),
            ..Default::default()
        }
    }

    pub fn of_type(schema_type: &str) -> Self {
        Schema {
            schema_type: schema_type.to_string(),
            ..Default::default()
        }
    }

    /// Name of the referenced component (trailing path segment of `$ref`).
    pub fn ref_name(&self) -> Option<&str> {
        if self.reference.is_empty() {
            None
        } else {
            Some(ref_name(&self.reference))
        }
    }

    /// `type` or `type (format)`.
    pub fn type_label(&self) -> String {
        if self.format.is_empty() {
            self.schema_type.clone()
        } else {
            format!("{} ({})", self.schema_type, self.format)
        }
    }
}

/// `#/components/schemas/Pet` → `Pet`.
pub fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}
