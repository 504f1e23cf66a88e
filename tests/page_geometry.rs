mod common;

use common::*;
use openapi_render::{Error, Margins, PageSize, PdfConverter, PdfOptions};

/// Width and height of every `/MediaBox` in the file, in page order.
fn media_boxes(pdf: &[u8]) -> Vec<(f32, f32)> {
    let text = String::from_utf8_lossy(pdf);
    let mut boxes = Vec::new();
    let mut rest = text.as_ref();
    while let Some(start) = rest.find("/MediaBox [") {
        rest = &rest[start + "/MediaBox [".len()..];
        let Some(end) = rest.find(']') else { break };
        let nums: Vec<f32> = rest[..end]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if nums.len() == 4 {
            boxes.push((nums[2] - nums[0], nums[3] - nums[1]));
        }
        rest = &rest[end..];
    }
    boxes
}

fn render_with(page_size: PageSize) -> openapi_render::RenderedPdf {
    let options = PdfOptions {
        page_size,
        ..Default::default()
    };
    PdfConverter::new(options).render(&petstore()).unwrap()
}

#[test]
fn a4_is_the_default_page() {
    let rendered = PdfConverter::default().render(&petstore()).unwrap();
    let boxes = media_boxes(&rendered.bytes);
    assert_eq!(boxes.len(), rendered.page_count);
    for (w, h) in boxes {
        assert!((w - 595.28).abs() < 0.1, "width {w}");
        assert!((h - 841.89).abs() < 0.1, "height {h}");
    }
}

#[test]
fn letter_pages_use_letter_dimensions() {
    let rendered = render_with(PageSize::Letter);
    let boxes = media_boxes(&rendered.bytes);
    assert!(!boxes.is_empty());
    assert!(boxes.iter().all(|&(w, h)| (w - 612.0).abs() < 0.1 && (h - 792.0).abs() < 0.1));
}

#[test]
fn output_is_a_complete_pdf_file() {
    let rendered = PdfConverter::default().render(&petstore()).unwrap();
    assert!(rendered.bytes.starts_with(b"%PDF-"));
    let tail = String::from_utf8_lossy(&rendered.bytes[rendered.bytes.len() - 16..]).into_owned();
    assert!(tail.contains("%%EOF"), "{tail:?}");
}

#[test]
fn margins_that_swallow_the_page_are_rejected() {
    let options = PdfOptions {
        margins: Margins {
            left: 300.0,
            right: 300.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let err = PdfConverter::new(options).render(&petstore()).unwrap_err();
    assert!(matches!(err, Error::InvalidPageGeometry { .. }), "{err}");
}
