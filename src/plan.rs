//! Deterministic ordering shared by every pass over a document.
//!
//! Link identifiers are allocated from a [`RenderPlan`] before any page
//! exists and consumed again while drawing. Both sides walk the same plan
//! value, so tag, endpoint and component order can never drift apart.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Document, Operation, PathItem, Schema};

/// Tag used for operations that declare none.
pub const DEFAULT_TAG: &str = "Default";

/// One operation as filed under one tag.
///
/// An operation with N tags yields N endpoint refs, each giving access to the
/// full operation so every tag section renders self-contained.
#[derive(Clone, Copy, Debug)]
pub struct EndpointRef<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub operation: &'a Operation,
}

impl EndpointRef<'_> {
    /// `"GET /pets"`, the endpoint's table-of-contents title.
    pub fn title(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Group operations by tag, sorting each tag's endpoints by `(path, method)`.
///
/// Ordering is plain byte-wise string comparison; the map iterates tags
/// lexicographically.
pub fn group_by_tag(paths: &[PathItem]) -> BTreeMap<String, Vec<EndpointRef<'_>>> {
    let mut result: BTreeMap<String, Vec<EndpointRef<'_>>> = BTreeMap::new();

    for item in paths {
        for op in &item.operations {
            let endpoint = EndpointRef {
                path: &item.path,
                method: &op.method,
                operation: op,
            };
            if op.tags.is_empty() {
                result.entry(DEFAULT_TAG.to_string()).or_default().push(endpoint);
            } else {
                for tag in &op.tags {
                    result.entry(tag.clone()).or_default().push(endpoint);
                }
            }
        }
    }

    for endpoints in result.values_mut() {
        endpoints.sort_by(|a, b| a.path.cmp(b.path).then_with(|| a.method.cmp(b.method)));
    }

    result
}

/// Every component schema name reachable from the endpoints' request bodies,
/// responses and parameters.
///
/// References are followed transitively through `components`; the result set
/// doubles as the visited set, so cyclic component graphs terminate. Names
/// are case-sensitive and iterate in lexicographic order.
pub fn collect_component_refs(
    endpoints: &[EndpointRef<'_>],
    components: &BTreeMap<String, Schema>,
) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();

    for ep in endpoints {
        let op = ep.operation;
        if let Some(body) = &op.request_body {
            for media in body.content.values() {
                collect_schema_refs(&media.schema, components, &mut refs);
            }
        }
        for resp in &op.responses {
            for media in resp.content.values() {
                collect_schema_refs(&media.schema, components, &mut refs);
            }
        }
        for param in &op.parameters {
            collect_schema_refs(&param.schema, components, &mut refs);
        }
    }

    refs
}

fn collect_schema_refs(
    schema: &Schema,
    components: &BTreeMap<String, Schema>,
    refs: &mut BTreeSet<String>,
) {
    if let Some(name) = schema.ref_name()
        && refs.insert(name.to_string())
        && let Some(target) = components.get(name)
    {
        collect_schema_refs(target, components, refs);
    }

    for prop in schema.properties.values() {
        collect_schema_refs(prop, components, refs);
    }

    if let Some(items) = &schema.items {
        collect_schema_refs(items, components, refs);
    }
}

/// One tag's slice of the plan.
#[derive(Clone, Debug)]
pub struct TagSection<'a> {
    pub name: String,
    pub description: Option<&'a str>,
    pub endpoints: Vec<EndpointRef<'a>>,
    /// Referenced component names that exist in the document, sorted.
    pub components: Vec<String>,
}

/// The single ordering every converter pass consumes read-only.
#[derive(Clone, Debug)]
pub struct RenderPlan<'a> {
    pub doc: &'a Document,
    pub tags: Vec<TagSection<'a>>,
}

impl<'a> RenderPlan<'a> {
    pub fn new(doc: &'a Document) -> Self {
        let tags = group_by_tag(&doc.paths)
            .into_iter()
            .map(|(name, endpoints)| {
                let components = collect_component_refs(&endpoints, &doc.components)
                    .into_iter()
                    .filter(|c| {
                        let known = doc.components.contains_key(c);
                        if !known {
                            log::debug!("tag {name}: reference to unknown component {c} skipped");
                        }
                        known
                    })
                    .collect();
                TagSection {
                    description: doc.tag_description(&name),
                    name,
                    endpoints,
                    components,
                }
            })
            .collect();

        RenderPlan { doc, tags }
    }

    pub fn has_servers(&self) -> bool {
        !self.doc.servers.is_empty()
    }

    pub fn endpoint_count(&self) -> usize {
        self.tags.iter().map(|t| t.endpoints.len()).sum()
    }
}

/// Build the shared plan for `doc`.
pub fn compute_render_plan(doc: &Document) -> RenderPlan<'_> {
    RenderPlan::new(doc)
}
