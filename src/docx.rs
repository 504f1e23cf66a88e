//! Minimal WordprocessingML package writer.

use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::Converter;
use crate::error::Error;
use crate::model::{Document, Operation, Schema};
use crate::plan::compute_render_plan;
use crate::text::strip_html;

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Part name and content type of every overridden part.
const OVERRIDES: &[(&str, &str)] = &[
    (
        "/word/document.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    ),
    (
        "/word/styles.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
    ),
];

/// Style id and (size in half-points, bold) for each paragraph style.
const STYLES: &[(&str, &str, u32, bool)] = &[
    ("Title", "Title", 56, true),
    ("Heading1", "heading 1", 32, true),
    ("Heading2", "heading 2", 28, true),
    ("Heading3", "heading 3", 24, true),
    ("Heading4", "heading 4", 22, true),
];

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn xml_writer() -> Result<XmlWriter, Error> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn start(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
    let mut elem = BytesStart::new(name);
    elem.extend_attributes(attrs.iter().copied());
    writer.write_event(Event::Start(elem))?;
    Ok(())
}

fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
    let mut elem = BytesStart::new(name);
    elem.extend_attributes(attrs.iter().copied());
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn content_types() -> Result<Vec<u8>, Error> {
    let mut w = xml_writer()?;
    start(&mut w, "Types", &[("xmlns", CT_NS)])?;
    empty(
        &mut w,
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    empty(
        &mut w,
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    for &(part, content_type) in OVERRIDES {
        empty(
            &mut w,
            "Override",
            &[("PartName", part), ("ContentType", content_type)],
        )?;
    }
    end(&mut w, "Types")?;
    Ok(w.into_inner().into_inner())
}

/// A relationships part holding a single `rId1` entry.
fn relationships(rel_type: &str, target: &str) -> Result<Vec<u8>, Error> {
    let rel_type = format!("{REL_NS}/{rel_type}");
    let mut w = xml_writer()?;
    start(&mut w, "Relationships", &[("xmlns", PKG_REL_NS)])?;
    empty(
        &mut w,
        "Relationship",
        &[("Id", "rId1"), ("Type", rel_type.as_str()), ("Target", target)],
    )?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner().into_inner())
}

fn styles_xml() -> Result<Vec<u8>, Error> {
    let mut w = xml_writer()?;
    start(&mut w, "w:styles", &[("xmlns:w", WML_NS)])?;

    start(
        &mut w,
        "w:style",
        &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
    )?;
    empty(&mut w, "w:name", &[("w:val", "Normal")])?;
    start(&mut w, "w:rPr", &[])?;
    empty(&mut w, "w:sz", &[("w:val", "22")])?;
    end(&mut w, "w:rPr")?;
    end(&mut w, "w:style")?;

    for &(id, name, size, bold) in STYLES {
        let size = size.to_string();
        start(&mut w, "w:style", &[("w:type", "paragraph"), ("w:styleId", id)])?;
        empty(&mut w, "w:name", &[("w:val", name)])?;
        empty(&mut w, "w:basedOn", &[("w:val", "Normal")])?;
        empty(&mut w, "w:next", &[("w:val", "Normal")])?;
        start(&mut w, "w:pPr", &[])?;
        empty(&mut w, "w:keepNext", &[])?;
        empty(&mut w, "w:spacing", &[("w:before", "240"), ("w:after", "120")])?;
        end(&mut w, "w:pPr")?;
        start(&mut w, "w:rPr", &[])?;
        if bold {
            empty(&mut w, "w:b", &[])?;
        }
        empty(&mut w, "w:sz", &[("w:val", size.as_str())])?;
        end(&mut w, "w:rPr")?;
        end(&mut w, "w:style")?;
    }

    end(&mut w, "w:styles")?;
    Ok(w.into_inner().into_inner())
}

/// Streams `word/document.xml`; paragraphs are written as they arrive.
struct Body {
    writer: XmlWriter,
}

impl Body {
    fn new() -> Result<Self, Error> {
        let mut writer = xml_writer()?;
        start(&mut writer, "w:document", &[("xmlns:w", WML_NS), ("xmlns:r", REL_NS)])?;
        start(&mut writer, "w:body", &[])?;
        Ok(Body { writer })
    }

    fn run(&mut self, text: &str) -> Result<(), Error> {
        let w = &mut self.writer;
        start(w, "w:r", &[])?;
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                empty(w, "w:br", &[])?;
            }
            start(w, "w:t", &[("xml:space", "preserve")])?;
            w.write_event(Event::Text(BytesText::new(line)))?;
            end(w, "w:t")?;
        }
        end(w, "w:r")
    }

    /// Level 0 is the document title.
    fn heading(&mut self, text: &str, level: u8) -> Result<(), Error> {
        let style = if level == 0 {
            "Title".to_string()
        } else {
            format!("Heading{level}")
        };
        start(&mut self.writer, "w:p", &[])?;
        start(&mut self.writer, "w:pPr", &[])?;
        empty(&mut self.writer, "w:pStyle", &[("w:val", style.as_str())])?;
        end(&mut self.writer, "w:pPr")?;
        self.run(text)?;
        end(&mut self.writer, "w:p")
    }

    fn paragraph(&mut self, text: &str) -> Result<(), Error> {
        start(&mut self.writer, "w:p", &[])?;
        self.run(text)?;
        end(&mut self.writer, "w:p")
    }

    fn empty(&mut self) -> Result<(), Error> {
        empty(&mut self.writer, "w:p", &[])
    }

    fn finish(mut self) -> Result<Vec<u8>, Error> {
        let w = &mut self.writer;
        start(w, "w:sectPr", &[])?;
        empty(w, "w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
        empty(
            w,
            "w:pgMar",
            &[
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
                ("w:header", "708"),
                ("w:footer", "708"),
                ("w:gutter", "0"),
            ],
        )?;
        end(w, "w:sectPr")?;
        end(w, "w:body")?;
        end(w, "w:document")?;
        Ok(self.writer.into_inner().into_inner())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DocxConverter;

impl DocxConverter {
    pub fn new() -> Self {
        DocxConverter
    }
}

impl Converter for DocxConverter {
    fn format(&self) -> &'static str {
        "docx"
    }

    fn convert(&self, doc: &Document) -> Result<Vec<u8>, Error> {
        let body = build_body(doc)?;
        write_package(&[
            ("[Content_Types].xml", content_types()?),
            ("_rels/.rels", relationships("officeDocument", "word/document.xml")?),
            ("word/document.xml", body.finish()?),
            ("word/styles.xml", styles_xml()?),
            ("word/_rels/document.xml.rels", relationships("styles", "styles.xml")?),
        ])
    }
}

fn write_package(parts: &[(&str, Vec<u8>)]) -> Result<Vec<u8>, Error> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        zip.start_file(*name, options)?;
        zip.write_all(content)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn build_body(doc: &Document) -> Result<Body, Error> {
    let mut body = Body::new()?;

    body.heading(&doc.title, 0)?;
    body.paragraph(&format!("Version: {}", doc.version))?;
    body.empty()?;

    if !doc.description.is_empty() {
        body.heading("Description", 1)?;
        body.paragraph(&strip_html(&doc.description))?;
        body.empty()?;
    }

    if !doc.servers.is_empty() {
        body.heading("Servers", 1)?;
        for server in &doc.servers {
            if server.description.is_empty() {
                body.paragraph(&format!("• {}", server.url))?;
            } else {
                body.paragraph(&format!("• {} - {}", server.url, server.description))?;
            }
        }
        body.empty()?;
    }

    if doc.paths.is_empty() {
        return Ok(body);
    }

    body.heading("API Endpoints", 1)?;
    let plan = compute_render_plan(doc);
    for tag in &plan.tags {
        body.heading(&tag.name, 2)?;

        if !tag.components.is_empty() {
            body.heading("Schemas Used", 3)?;
            for name in &tag.components {
                if let Some(schema) = doc.components.get(name) {
                    component_schema(&mut body, name, schema)?;
                }
            }
            body.empty()?;
        }

        for ep in &tag.endpoints {
            operation(&mut body, ep.path, ep.operation)?;
        }
    }
    Ok(body)
}

fn component_schema(body: &mut Body, name: &str, schema: &Schema) -> Result<(), Error> {
    body.heading(name, 4)?;
    let type_label = schema.type_label();
    if !type_label.is_empty() {
        body.paragraph(&format!("Type: {type_label}"))?;
    }
    if !schema.description.is_empty() {
        body.paragraph(&strip_html(&schema.description))?;
    }
    if !schema.properties.is_empty() {
        body.paragraph("Properties:")?;
        for (prop_name, prop) in &schema.properties {
            let prop_type = match prop.ref_name() {
                Some(r) => r.to_string(),
                None => prop.type_label(),
            };
            let desc = if prop.description.is_empty() {
                String::new()
            } else {
                format!(" - {}", strip_html(&prop.description))
            };
            body.paragraph(&format!("  • {prop_name} ({prop_type}){desc}"))?;
        }
    }
    body.empty()
}

fn operation(body: &mut Body, path: &str, op: &Operation) -> Result<(), Error> {
    body.heading(&format!("{} {path}", op.method), 3)?;
    if !op.summary.is_empty() {
        body.paragraph(&op.summary)?;
    }
    if !op.description.is_empty() {
        body.paragraph(&strip_html(&op.description))?;
    }
    if !op.parameters.is_empty() {
        body.heading("Parameters", 4)?;
        for p in &op.parameters {
            let required = if p.required { " (required)" } else { "" };
            body.paragraph(&format!(
                "• {} ({}): {}{required}",
                p.name,
                p.location,
                strip_html(&p.description)
            ))?;
        }
    }
    if !op.responses.is_empty() {
        body.heading("Responses", 4)?;
        for r in &op.responses {
            body.paragraph(&format!("• {}: {}", r.status_code, strip_html(&r.description)))?;
        }
    }
    body.empty()
}
