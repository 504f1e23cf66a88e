mod common;

use common::*;
use openapi_render::plan::{DEFAULT_TAG, compute_render_plan, group_by_tag};
use pretty_assertions::assert_eq;

fn titles(doc: &openapi_render::model::Document, tag: &str) -> Vec<String> {
    group_by_tag(&doc.paths)[tag]
        .iter()
        .map(|ep| ep.title())
        .collect()
}

#[test]
fn endpoints_sort_by_path_then_method() {
    let doc = document(vec![
        path("/b", vec![op("POST", &["t"])]),
        path("/a", vec![op("GET", &["t"])]),
        path("/b", vec![op("GET", &["t"])]),
    ]);
    assert_eq!(titles(&doc, "t"), vec!["GET /a", "GET /b", "POST /b"]);
}

#[test]
fn ordering_is_bytewise_not_method_priority() {
    let doc = document(vec![path(
        "/x",
        vec![op("PUT", &["t"]), op("DELETE", &["t"]), op("GET", &["t"])],
    )]);
    assert_eq!(titles(&doc, "t"), vec!["DELETE /x", "GET /x", "PUT /x"]);
}

#[test]
fn multi_tag_operation_is_filed_under_each_tag() {
    let mut invoice = op("POST", &["Billing", "Admin"]);
    invoice = with_param(invoice, "dry_run", openapi_render::model::Schema::of_type("boolean"));
    invoice = with_response(invoice, "201", schema_ref("Invoice"));
    let doc = document(vec![path("/invoices", vec![invoice])]);

    let grouped = group_by_tag(&doc.paths);
    assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["Admin", "Billing"]);
    for tag in ["Admin", "Billing"] {
        let eps = &grouped[tag];
        assert_eq!(eps.len(), 1);
        assert_eq!(eps[0].path, "/invoices");
        assert_eq!(eps[0].operation.parameters.len(), 1);
        assert_eq!(eps[0].operation.responses[0].status_code, "201");
    }
}

#[test]
fn untagged_operations_land_in_default() {
    let doc = document(vec![
        path("/health", vec![op("GET", &[])]),
        path("/pets", vec![op("GET", &["pets"])]),
    ]);
    let grouped = group_by_tag(&doc.paths);
    assert_eq!(grouped[DEFAULT_TAG].len(), 1);
    assert_eq!(grouped[DEFAULT_TAG][0].path, "/health");
}

#[test]
fn plan_iterates_tags_lexicographically() {
    let doc = document(vec![
        path("/z", vec![op("GET", &["zeta"])]),
        path("/a", vec![op("GET", &["Alpha"])]),
        path("/m", vec![op("GET", &["mid"])]),
    ]);
    let plan = compute_render_plan(&doc);
    let names: Vec<&str> = plan.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "mid", "zeta"]);
    assert_eq!(plan.endpoint_count(), 3);
}

#[test]
fn plan_carries_tag_descriptions() {
    let doc = with_tag(
        document(vec![path("/a", vec![op("GET", &["a"]), op("PUT", &["b"])])]),
        "a",
        "Tag A",
    );
    let plan = compute_render_plan(&doc);
    assert_eq!(plan.tags[0].description, Some("Tag A"));
    assert_eq!(plan.tags[1].description, None);
}
