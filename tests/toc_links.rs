mod common;

use std::collections::HashSet;

use common::*;
use openapi_render::plan::compute_render_plan;
use openapi_render::{LinkRegistry, PdfConverter, TocEntry, plan_toc};
use pretty_assertions::assert_eq;

fn outline(toc: &[TocEntry]) -> Vec<(u8, String)> {
    toc.iter().map(|e| (e.level, e.title.clone())).collect()
}

#[test]
fn toc_structure_without_servers() {
    let doc = document(vec![
        path("/b", vec![op("GET", &["beta"])]),
        path("/a", vec![op("POST", &["alpha"]), op("GET", &["alpha"])]),
    ]);
    let plan = compute_render_plan(&doc);
    let mut links = LinkRegistry::new();
    let toc = plan_toc(&plan, &mut links);

    let expected: Vec<(u8, String)> = vec![
        (1, "Overview".into()),
        (1, "API Endpoints".into()),
        (2, "alpha".into()),
        (3, "GET /a".into()),
        (3, "POST /a".into()),
        (2, "beta".into()),
        (3, "GET /b".into()),
    ];
    assert_eq!(outline(&toc), expected);
    assert_eq!(links.allocated(), toc.len());
}

#[test]
fn servers_entry_appears_exactly_once_when_servers_exist() {
    let doc = with_servers(
        document(vec![path("/a", vec![op("GET", &["t"])])]),
        &["https://one.example.com", "https://two.example.com"],
    );
    let plan = compute_render_plan(&doc);
    let toc = plan_toc(&plan, &mut LinkRegistry::new());
    let servers = toc.iter().filter(|e| e.title == "Servers").count();
    assert_eq!(servers, 1);
    assert_eq!(toc[1].title, "Servers");
    assert_eq!(toc[1].level, 1);
}

#[test]
fn long_titles_truncate_for_display_only() {
    let long_path = format!("/{}", "segment/".repeat(12));
    let doc = document(vec![path(&long_path, vec![op("GET", &["t"])])]);
    let plan = compute_render_plan(&doc);
    let toc = plan_toc(&plan, &mut LinkRegistry::new());
    let entry = toc.last().unwrap();

    assert_eq!(entry.title, format!("GET {long_path}"));
    let shown = entry.display_title();
    assert_eq!(shown.chars().count(), 60);
    assert!(shown.ends_with("..."));
}

#[test]
fn every_target_is_bound_once_in_toc_order() {
    init_logging();
    let doc = petstore();
    let rendered = PdfConverter::default().render(&doc).unwrap();

    let bound: HashSet<_> = rendered.bound_targets.iter().copied().collect();
    assert_eq!(bound.len(), rendered.bound_targets.len(), "a target was bound twice");
    assert_eq!(rendered.bound_targets.len(), rendered.allocated);

    let toc_targets: Vec<_> = rendered.toc.iter().map(|e| e.target).collect();
    let toc_set: HashSet<_> = toc_targets.iter().copied().collect();
    let bound_toc: Vec<_> = rendered
        .bound_targets
        .iter()
        .copied()
        .filter(|t| toc_set.contains(t))
        .collect();
    assert_eq!(bound_toc, toc_targets);

    for link in &rendered.placed_links {
        assert!(bound.contains(&link.target), "link to unbound target");
    }
}

#[test]
fn resolved_pages_follow_toc_order() {
    let rendered = PdfConverter::default().render(&petstore()).unwrap();
    let pages: Vec<usize> = rendered
        .toc
        .iter()
        .map(|e| e.resolved_page.expect("every TOC entry lands on a page"))
        .collect();
    assert!(pages.windows(2).all(|w| w[0] <= w[1]), "{pages:?}");
    // Title page and table of contents come first.
    assert!(pages[0] >= 3);
    assert!(*pages.last().unwrap() <= rendered.page_count);
}

#[test]
fn shared_component_gets_one_target_per_tag() {
    let doc = widget_document();
    let rendered = PdfConverter::default().render(&doc).unwrap();

    let widget: Vec<_> = rendered
        .components
        .iter()
        .filter(|c| c.key.schema == "Widget")
        .collect();
    assert_eq!(widget.len(), 2);
    assert_ne!(widget[0].target, widget[1].target);

    let tag_page = |name: &str| {
        rendered
            .toc
            .iter()
            .find(|e| e.level == 2 && e.title == name)
            .and_then(|e| e.resolved_page)
            .unwrap()
    };
    let billing_start = tag_page("Billing");
    let shipping_start = tag_page("Shipping");
    assert!(billing_start < shipping_start);

    for c in &widget {
        let (lo, hi) = match c.key.tag.as_str() {
            "Billing" => (billing_start, shipping_start - 1),
            "Shipping" => (shipping_start, rendered.page_count),
            other => panic!("unexpected tag {other}"),
        };
        let dest = c.page.unwrap();
        assert!((lo..=hi).contains(&dest), "{} bound outside its section", c.key.tag);

        let clicks: Vec<usize> = rendered
            .placed_links
            .iter()
            .filter(|l| l.target == c.target)
            .map(|l| l.page + 1)
            .collect();
        assert!(!clicks.is_empty(), "{} widget never linked", c.key.tag);
        assert!(clicks.iter().all(|p| (lo..=hi).contains(p)));
    }
}

#[test]
fn conversions_start_from_fresh_state() {
    let doc = petstore();
    let converter = PdfConverter::default();
    let a = converter.render(&doc).unwrap();
    let b = converter.render(&doc).unwrap();
    assert_eq!(a.allocated, b.allocated);
    assert_eq!(a.toc, b.toc);
    assert_eq!(a.bytes, b.bytes);
}
