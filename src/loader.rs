//! OpenAPI 3.x JSON or YAML into the [`Document`] model.
//!
//! Parameters, request bodies, responses and examples written as `$ref` are
//! resolved one level against `components`. Schema references stay
//! name-only, so cyclic component graphs load as a finite tree.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::model::{
    Document, MediaType, Operation, Parameter, PathItem, RequestBody, Response, Schema, Server,
    Tag, ref_name,
};

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RefOr<T> {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

impl<T> RefOr<T> {
    fn resolve<'r>(&'r self, pool: &'r BTreeMap<String, T>, kind: &str) -> Option<&'r T> {
        match self {
            RefOr::Item(item) => Some(item),
            RefOr::Ref { reference } => {
                let found = pool.get(ref_name(reference));
                if found.is_none() {
                    log::debug!("unresolved {kind} reference {reference} skipped");
                }
                found
            }
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawDocument {
    info: RawInfo,
    servers: Vec<RawServer>,
    tags: Vec<RawTag>,
    paths: BTreeMap<String, RawPathItem>,
    components: RawComponents,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawInfo {
    title: String,
    version: String,
    description: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawServer {
    url: String,
    description: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawTag {
    name: String,
    description: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawPathItem {
    parameters: Vec<RefOr<RawParameter>>,
    get: Option<RawOperation>,
    put: Option<RawOperation>,
    post: Option<RawOperation>,
    delete: Option<RawOperation>,
    options: Option<RawOperation>,
    head: Option<RawOperation>,
    patch: Option<RawOperation>,
    trace: Option<RawOperation>,
}

impl RawPathItem {
    fn operations(&self) -> impl Iterator<Item = (&'static str, &RawOperation)> {
        [
            ("GET", &self.get),
            ("PUT", &self.put),
            ("POST", &self.post),
            ("DELETE", &self.delete),
            ("OPTIONS", &self.options),
            ("HEAD", &self.head),
            ("PATCH", &self.patch),
            ("TRACE", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawOperation {
    summary: String,
    description: String,
    operation_id: String,
    tags: Vec<String>,
    parameters: Vec<RefOr<RawParameter>>,
    request_body: Option<RefOr<RawRequestBody>>,
    responses: BTreeMap<String, RefOr<RawResponse>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    description: String,
    required: bool,
    schema: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawRequestBody {
    description: String,
    required: bool,
    content: BTreeMap<String, RawMediaType>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawResponse {
    description: String,
    content: BTreeMap<String, RawMediaType>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawMediaType {
    schema: Option<Value>,
    example: Option<Value>,
    examples: BTreeMap<String, RefOr<RawExample>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawExample {
    value: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawComponents {
    schemas: BTreeMap<String, Value>,
    parameters: BTreeMap<String, RawParameter>,
    request_bodies: BTreeMap<String, RawRequestBody>,
    responses: BTreeMap<String, RawResponse>,
    examples: BTreeMap<String, RawExample>,
}

/// Read and map an OpenAPI file. `.yaml` and `.yml` files are always read as
/// YAML; anything else goes through [`parse_document`].
pub fn load_document(path: &Path) -> Result<Document, Error> {
    let bytes = std::fs::read(path)?;
    let yaml_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    if yaml_ext {
        let raw: RawDocument = serde_yaml::from_slice(&bytes)?;
        return Ok(map_document(&raw));
    }
    parse_document(&bytes)
}

/// Map OpenAPI bytes. A body whose first non-blank byte is `{` is JSON,
/// anything else is YAML. Only the shape is checked, not the content.
pub fn parse_document(bytes: &[u8]) -> Result<Document, Error> {
    let raw: RawDocument = if looks_like_json(bytes) {
        serde_json::from_slice(bytes)?
    } else {
        log::debug!("input is not a JSON object, reading it as YAML");
        serde_yaml::from_slice(bytes)?
    };
    Ok(map_document(&raw))
}

fn looks_like_json(bytes: &[u8]) -> bool {
    bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')
}

fn map_document(raw: &RawDocument) -> Document {
    let components = &raw.components;
    let paths = raw
        .paths
        .iter()
        .map(|(path, item)| PathItem {
            path: path.clone(),
            operations: item
                .operations()
                .map(|(method, op)| map_operation(method, op, &item.parameters, components))
                .collect(),
        })
        .collect();

    Document {
        title: raw.info.title.clone(),
        version: raw.info.version.clone(),
        description: raw.info.description.clone(),
        servers: raw
            .servers
            .iter()
            .map(|s| Server {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect(),
        tags: raw
            .tags
            .iter()
            .map(|t| Tag {
                name: t.name.clone(),
                description: t.description.clone(),
            })
            .collect(),
        paths,
        components: components
            .schemas
            .iter()
            .map(|(name, value)| (name.clone(), map_schema(value)))
            .collect(),
    }
}

fn map_operation(
    method: &str,
    op: &RawOperation,
    shared_params: &[RefOr<RawParameter>],
    components: &RawComponents,
) -> Operation {
    let own: Vec<&RawParameter> = op
        .parameters
        .iter()
        .filter_map(|p| p.resolve(&components.parameters, "parameter"))
        .collect();
    // Operation-level parameters override path-level ones with the same name and location.
    let inherited = shared_params
        .iter()
        .filter_map(|p| p.resolve(&components.parameters, "parameter"))
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        });
    let parameters = inherited.chain(own.iter().copied()).map(map_parameter).collect();

    let request_body = op
        .request_body
        .as_ref()
        .and_then(|b| b.resolve(&components.request_bodies, "request body"))
        .map(|b| RequestBody {
            description: b.description.clone(),
            required: b.required,
            content: map_content(&b.content, components),
        });

    let responses = op
        .responses
        .iter()
        .filter_map(|(status, r)| {
            let r = r.resolve(&components.responses, "response")?;
            Some(Response {
                status_code: status.clone(),
                description: r.description.clone(),
                content: map_content(&r.content, components),
            })
        })
        .collect();

    Operation {
        method: method.to_string(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        operation_id: op.operation_id.clone(),
        tags: op.tags.clone(),
        parameters,
        request_body,
        responses,
    }
}

fn map_parameter(p: &RawParameter) -> Parameter {
    Parameter {
        name: p.name.clone(),
        location: p.location.clone(),
        description: p.description.clone(),
        required: p.required,
        schema: p.schema.as_ref().map(map_schema).unwrap_or_default(),
    }
}

fn map_content(
    content: &BTreeMap<String, RawMediaType>,
    components: &RawComponents,
) -> BTreeMap<String, MediaType> {
    content
        .iter()
        .map(|(content_type, media)| {
            let examples = media
                .examples
                .iter()
                .filter_map(|(name, ex)| {
                    let value = ex.resolve(&components.examples, "example")?.value.clone()?;
                    Some((name.clone(), value))
                })
                .collect();
            let mapped = MediaType {
                schema: media.schema.as_ref().map(map_schema).unwrap_or_default(),
                example: media.example.clone(),
                examples,
            };
            (content_type.clone(), mapped)
        })
        .collect()
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// `type` as a string, or the first non-null entry of a 3.1 type array.
fn schema_type(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(t)) => t.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// A composition holding exactly one `$ref` reads as that reference.
fn single_composed_ref(obj: &serde_json::Map<String, Value>) -> Option<&str> {
    ["allOf", "oneOf", "anyOf"].iter().find_map(|key| {
        match obj.get(*key)?.as_array()?.as_slice() {
            [only] => only.get("$ref")?.as_str(),
            _ => None,
        }
    })
}

fn map_schema(value: &Value) -> Schema {
    let Some(obj) = value.as_object() else {
        return Schema::default();
    };

    let reference = obj
        .get("$ref")
        .and_then(Value::as_str)
        .or_else(|| single_composed_ref(obj));
    if let Some(reference) = reference {
        let mut schema = Schema::named(reference);
        schema.description = string_field(obj, "description");
        return schema;
    }

    Schema {
        schema_type: schema_type(obj.get("type")),
        format: string_field(obj, "format"),
        description: string_field(obj, "description"),
        properties: obj
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), map_schema(prop)))
                    .collect()
            })
            .unwrap_or_default(),
        items: obj.get("items").map(|items| Box::new(map_schema(items))),
        reference: String::new(),
    }
}
