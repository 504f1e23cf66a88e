mod common;

use common::*;
use openapi_render::model::Schema;
use openapi_render::{PageSize, PdfConverter, PdfOptions};

const EPS: f32 = 0.01;

#[test]
fn large_document_never_draws_below_the_bottom_margin() {
    init_logging();
    let doc = large_document(4, 12);
    let rendered = PdfConverter::default().render(&doc).unwrap();

    assert!(rendered.page_count > 12, "only {} pages", rendered.page_count);
    assert!(
        rendered.max_content_y <= rendered.bottom_limit + EPS,
        "drew at y={} past limit {}",
        rendered.max_content_y,
        rendered.bottom_limit
    );
}

#[test]
fn letter_pages_respect_their_own_limit() {
    let options = PdfOptions {
        page_size: PageSize::Letter,
        ..Default::default()
    };
    let rendered = PdfConverter::new(options).render(&large_document(2, 8)).unwrap();
    assert!((rendered.bottom_limit - (792.0 - 20.0 * 72.0 / 25.4)).abs() < EPS);
    assert!(rendered.max_content_y <= rendered.bottom_limit + EPS);
}

#[test]
fn tall_table_row_moves_to_the_next_page() {
    let mut op = op("GET", &["t"]);
    for i in 0..40 {
        let mut schema = Schema::of_type("string");
        schema.description = format!("field {i}");
        op = with_param(op, &format!("p{i}"), schema);
    }
    op.parameters[20].description = "word ".repeat(150);
    let doc = document(vec![path("/big", vec![op])]);

    let rendered = PdfConverter::default().render(&doc).unwrap();
    assert!(rendered.page_count >= 6);
    assert!(rendered.max_content_y <= rendered.bottom_limit + EPS);
}

#[test]
fn long_examples_continue_on_following_pages() {
    let mut op = with_response(op("GET", &["t"]), "200", Schema::of_type("array"));
    let rows: Vec<serde_json::Value> = (0..400)
        .map(|i| serde_json::json!({"id": i, "name": format!("item {i}")}))
        .collect();
    op.responses[0]
        .content
        .get_mut("application/json")
        .unwrap()
        .example = Some(serde_json::Value::Array(rows));
    let doc = document(vec![path("/items", vec![op])]);

    let rendered = PdfConverter::default().render(&doc).unwrap();
    assert!(rendered.page_count > 10);
    assert!(rendered.max_content_y <= rendered.bottom_limit + EPS);
}

#[test]
fn every_tag_section_starts_on_a_new_page() {
    let doc = large_document(3, 1);
    let rendered = PdfConverter::default().render(&doc).unwrap();
    let tag_pages: Vec<usize> = rendered
        .toc
        .iter()
        .filter(|e| e.level == 2)
        .map(|e| e.resolved_page.unwrap())
        .collect();
    assert_eq!(tag_pages.len(), 3);
    assert!(tag_pages.windows(2).all(|w| w[0] < w[1]));
}
