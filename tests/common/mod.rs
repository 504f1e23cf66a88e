#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use openapi_render::model::{
    Document, MediaType, Operation, Parameter, PathItem, RequestBody, Response, Schema, Server,
    Tag,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new("tests/fixtures").join(name)
}

pub fn petstore() -> Document {
    openapi_render::load_document(&fixture_path("petstore.json")).expect("load petstore fixture")
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "openapi-render-{label}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

pub fn schema_ref(name: &str) -> Schema {
    Schema::named(&format!("#/components/schemas/{name}"))
}

pub fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    BTreeMap::from([(
        "application/json".to_string(),
        MediaType {
            schema,
            ..Default::default()
        },
    )])
}

pub fn op(method: &str, tags: &[&str]) -> Operation {
    Operation {
        method: method.to_string(),
        summary: format!("{method} summary"),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

pub fn with_response(mut op: Operation, status: &str, schema: Schema) -> Operation {
    op.responses.push(Response {
        status_code: status.to_string(),
        description: format!("{status} response"),
        content: json_content(schema),
    });
    op
}

pub fn with_body(mut op: Operation, schema: Schema) -> Operation {
    op.request_body = Some(RequestBody {
        description: String::new(),
        required: true,
        content: json_content(schema),
    });
    op
}

pub fn with_param(mut op: Operation, name: &str, schema: Schema) -> Operation {
    op.parameters.push(Parameter {
        name: name.to_string(),
        location: "query".to_string(),
        description: format!("the {name}"),
        required: false,
        schema,
    });
    op
}

pub fn path(p: &str, operations: Vec<Operation>) -> PathItem {
    PathItem {
        path: p.to_string(),
        operations,
    }
}

pub fn object(props: &[(&str, Schema)]) -> Schema {
    let mut schema = Schema::of_type("object");
    schema.properties = props
        .iter()
        .map(|(name, s)| (name.to_string(), s.clone()))
        .collect();
    schema
}

pub fn array_of(items: Schema) -> Schema {
    let mut schema = Schema::of_type("array");
    schema.items = Some(Box::new(items));
    schema
}

pub fn document(paths: Vec<PathItem>) -> Document {
    Document {
        title: "Test API".to_string(),
        version: "1.0.0".to_string(),
        description: "Integration test document".to_string(),
        paths,
        ..Default::default()
    }
}

pub fn with_servers(mut doc: Document, urls: &[&str]) -> Document {
    doc.servers = urls
        .iter()
        .map(|u| Server {
            url: u.to_string(),
            description: String::new(),
        })
        .collect();
    doc
}

pub fn with_tag(mut doc: Document, name: &str, description: &str) -> Document {
    doc.tags.push(Tag {
        name: name.to_string(),
        description: description.to_string(),
    });
    doc
}

/// `Widget` used from two tags, with a nested `Part`.
pub fn widget_document() -> Document {
    let mut doc = document(vec![
        path(
            "/billing/widgets",
            vec![with_response(op("GET", &["Billing"]), "200", schema_ref("Widget"))],
        ),
        path(
            "/shipping/widgets",
            vec![with_body(op("POST", &["Shipping"]), schema_ref("Widget"))],
        ),
    ]);
    doc.components.insert(
        "Widget".to_string(),
        object(&[("id", Schema::of_type("integer")), ("part", schema_ref("Part"))]),
    );
    doc.components
        .insert("Part".to_string(), object(&[("sku", Schema::of_type("string"))]));
    doc
}

/// Many tags and endpoints with long text, for multi-page layouts.
pub fn large_document(tags: usize, endpoints_per_tag: usize) -> Document {
    let long = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(12);
    let mut paths = Vec::new();
    for t in 0..tags {
        for e in 0..endpoints_per_tag {
            let tag = format!("tag{t:02}");
            let mut get = op("GET", &[tag.as_str()]);
            get.description = long.clone();
            for p in 0..6 {
                get = with_param(get, &format!("param{p}"), Schema::of_type("string"));
            }
            get = with_response(get, "200", array_of(schema_ref("Item")));
            get = with_response(get, "404", schema_ref("Problem"));
            paths.push(path(&format!("/{tag}/resource{e:02}"), vec![get]));
        }
    }
    let mut doc = with_servers(document(paths), &["https://api.example.com"]);
    doc.description = long;
    let mut item = object(&[
        ("id", Schema::of_type("integer")),
        ("name", Schema::of_type("string")),
        ("children", array_of(schema_ref("Item"))),
    ]);
    item.description = "A recursive item".to_string();
    doc.components.insert("Item".to_string(), item);
    doc.components.insert(
        "Problem".to_string(),
        object(&[("title", Schema::of_type("string"))]),
    );
    doc
}
