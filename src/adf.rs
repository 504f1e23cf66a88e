//! Atlassian Document Format (Confluence) JSON.

use serde::Serialize;

use crate::Converter;
use crate::error::Error;
use crate::model::{Document, Operation, Parameter, Response, Server};

#[derive(Serialize, Debug)]
struct AdfDocument {
    version: u32,
    #[serde(rename = "type")]
    kind: &'static str,
    content: Vec<Node>,
}

#[derive(Serialize, Debug, Default)]
struct Node {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attrs: Option<Attrs>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    content: Vec<Node>,
    #[serde(skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    marks: Vec<Mark>,
}

#[derive(Serialize, Debug)]
struct Attrs {
    level: u8,
}

#[derive(Serialize, Debug)]
struct Mark {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl Node {
    /// Text nodes must carry text, so empty ones are dropped here.
    fn block(kind: &'static str, content: Vec<Node>) -> Self {
        Node {
            kind,
            content: content.into_iter().filter(|n| !n.is_empty_text()).collect(),
            ..Default::default()
        }
    }

    fn is_empty_text(&self) -> bool {
        self.kind == "text" && self.text.is_empty()
    }

    fn text(text: impl Into<String>) -> Self {
        Node {
            kind: "text",
            text: text.into(),
            ..Default::default()
        }
    }

    fn marked(text: impl Into<String>, mark: &'static str) -> Self {
        Node {
            marks: vec![Mark { kind: mark }],
            ..Node::text(text)
        }
    }

    fn heading(text: &str, level: u8) -> Self {
        Node {
            attrs: Some(Attrs { level }),
            ..Node::block("heading", vec![Node::text(text)])
        }
    }

    fn paragraph(text: &str) -> Self {
        Node::block("paragraph", vec![Node::text(text)])
    }

    fn list_item(inline: Vec<Node>) -> Self {
        Node::block("listItem", vec![Node::block("paragraph", inline)])
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AdfConverter;

impl AdfConverter {
    pub fn new() -> Self {
        AdfConverter
    }
}

impl Converter for AdfConverter {
    fn format(&self) -> &'static str {
        "confluence"
    }

    fn convert(&self, doc: &Document) -> Result<Vec<u8>, Error> {
        let adf = build(doc);
        let mut out = serde_json::to_vec_pretty(&adf).map_err(Error::Adf)?;
        out.push(b'\n');
        Ok(out)
    }
}

fn build(doc: &Document) -> AdfDocument {
    let mut content = vec![
        Node::heading(&doc.title, 1),
        Node::paragraph(&format!("Version: {}", doc.version)),
    ];

    if !doc.description.is_empty() {
        content.push(Node::heading("Description", 2));
        content.push(Node::paragraph(&doc.description));
    }

    if !doc.servers.is_empty() {
        content.push(Node::heading("Servers", 2));
        content.push(server_list(&doc.servers));
    }

    if !doc.paths.is_empty() {
        content.push(Node::heading("API Endpoints", 2));
        for item in &doc.paths {
            for op in &item.operations {
                operation_nodes(&item.path, op, &mut content);
            }
        }
    }

    AdfDocument {
        version: 1,
        kind: "doc",
        content,
    }
}

fn server_list(servers: &[Server]) -> Node {
    let items = servers
        .iter()
        .map(|s| {
            let text = if s.description.is_empty() {
                s.url.clone()
            } else {
                format!("{} - {}", s.url, s.description)
            };
            Node::list_item(vec![Node::text(text)])
        })
        .collect();
    Node::block("bulletList", items)
}

fn operation_nodes(path: &str, op: &Operation, out: &mut Vec<Node>) {
    out.push(Node::heading(&format!("{} {path}", op.method), 3));
    if !op.summary.is_empty() {
        out.push(Node::block(
            "paragraph",
            vec![Node::marked(op.summary.as_str(), "strong")],
        ));
    }
    if !op.description.is_empty() {
        out.push(Node::paragraph(&op.description));
    }
    if !op.parameters.is_empty() {
        out.push(Node::heading("Parameters", 4));
        out.push(parameter_list(&op.parameters));
    }
    if !op.responses.is_empty() {
        out.push(Node::heading("Responses", 4));
        out.push(response_list(&op.responses));
    }
    out.push(Node::block("rule", Vec::new()));
}

fn parameter_list(params: &[Parameter]) -> Node {
    let items = params
        .iter()
        .map(|p| {
            let required = if p.required { " (required)" } else { "" };
            Node::list_item(vec![
                Node::marked(p.name.as_str(), "code"),
                Node::text(format!(" ({}): {}{required}", p.location, p.description)),
            ])
        })
        .collect();
    Node::block("bulletList", items)
}

fn response_list(responses: &[Response]) -> Node {
    let items = responses
        .iter()
        .map(|r| {
            Node::list_item(vec![
                Node::marked(r.status_code.as_str(), "code"),
                Node::text(format!(": {}", r.description)),
            ])
        })
        .collect();
    Node::block("bulletList", items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PathItem;

    fn has_empty_text(node: &serde_json::Value) -> bool {
        if node["type"] == "text" && node["text"].as_str().is_none_or(str::is_empty) {
            return true;
        }
        node["content"]
            .as_array()
            .is_some_and(|children| children.iter().any(has_empty_text))
    }

    #[test]
    fn blank_strings_leave_no_empty_text_nodes() {
        let op = Operation {
            method: "GET".to_string(),
            parameters: vec![Parameter {
                name: "q".to_string(),
                location: "query".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let doc = Document {
            paths: vec![PathItem {
                path: "/search".to_string(),
                operations: vec![op],
            }],
            ..Default::default()
        };

        let bytes = AdfConverter::new().convert(&doc).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(!has_empty_text(&json), "{json:#}");

        let title = &json["content"][0];
        assert_eq!(title["type"], "heading");
        assert!(title.get("content").is_none());
    }
}
