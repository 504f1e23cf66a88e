use std::collections::HashMap;

use serde_json::Value;

use crate::config::MM;
use crate::fonts::FontStyle;
use crate::model::{Document, MediaType, Operation, Parameter, RequestBody, Response, Schema};
use crate::plan::{EndpointRef, RenderPlan, TagSection};
use crate::text::{example_text, strip_html, truncate};

use super::links::{LinkRegistry, LinkTarget};
use super::surface::{Align, BLACK, CellStyle, Color, Flow, Surface};
use super::table::{self, LINK_BLUE, TableCell};
use super::toc::{TOC_TITLE_LIMIT, TocCursor, TocEntry};

const GRAY: Color = [128, 128, 128];
const MUTED: Color = [100, 100, 100];
const SUBHEAD: Color = [60, 60, 60];
const WHITE: Color = [255, 255, 255];
const RULE: Color = [220, 220, 220];
const BORDER: Color = [180, 180, 180];

/// Extra headroom explicit block checks keep above the bottom margin, in mm.
const BLOCK_SLACK_MM: f32 = 10.0;

/// Width reserved for printed page numbers in the table of contents, in mm.
const TOC_PAGE_COL_MM: f32 = 15.0;

fn mm(v: f32) -> f32 {
    v * MM
}

fn method_color(method: &str) -> Color {
    match method {
        "GET" => [97, 175, 254],
        "POST" => [73, 204, 144],
        "PUT" => [252, 161, 48],
        "DELETE" => [249, 62, 62],
        "PATCH" => [80, 227, 194],
        "HEAD" => [144, 97, 249],
        _ => GRAY,
    }
}

/// Display label of a schema and the component it points at, if any.
/// Arrays of references read `[]Name` and link to `Name`.
fn object_label(schema: &Schema) -> (String, Option<&str>) {
    if let Some(name) = schema.ref_name() {
        return (name.to_string(), Some(name));
    }
    if schema.schema_type == "array"
        && let Some(items) = &schema.items
    {
        return match items.ref_name() {
            Some(name) => (format!("[]{name}"), Some(name)),
            None => (format!("[]{}", items.type_label()), None),
        };
    }
    (schema.type_label(), None)
}

/// One layout pass over a plan.
///
/// Owns the surface and the cursor for the duration of the pass; nothing
/// survives it except what [`Surface::finish`] hands back.
pub(super) struct Layout<'p, 'a> {
    plan: &'p RenderPlan<'a>,
    links: &'p LinkRegistry,
    toc: &'p [TocEntry],
    cursor: TocCursor<'p>,
    /// 1-based pages from a previous pass, printed in the table of contents.
    page_numbers: Option<&'p HashMap<LinkTarget, usize>>,
    surface: Surface,
    current_tag: &'p str,
}

impl<'p, 'a> Layout<'p, 'a> {
    pub(super) fn new(
        plan: &'p RenderPlan<'a>,
        links: &'p LinkRegistry,
        toc: &'p [TocEntry],
        page_numbers: Option<&'p HashMap<LinkTarget, usize>>,
        surface: Surface,
    ) -> Self {
        Layout {
            plan,
            links,
            toc,
            cursor: TocCursor::new(toc),
            page_numbers,
            surface,
            current_tag: "",
        }
    }

    /// Lay out the whole document and hand back the drawn surface.
    pub(super) fn run(mut self) -> Surface {
        let doc = self.plan.doc;
        self.title_page(doc);
        self.table_of_contents();
        self.overview(doc);
        if self.plan.has_servers() {
            self.servers(doc);
        }
        self.endpoints_header();
        let plan = self.plan;
        for tag in &plan.tags {
            self.tag_section(tag);
        }
        if self.cursor.remaining() > 0 {
            log::error!("{} TOC entries never rendered", self.cursor.remaining());
        }
        log::debug!("layout pass finished on {} pages", self.surface.page_count());
        self.surface
    }

    fn content_width(&self) -> f32 {
        self.surface.geometry().content_width()
    }

    fn left(&self) -> f32 {
        self.surface.geometry().margins.left
    }

    fn ensure_block(&mut self, h_mm: f32) -> bool {
        self.surface.ensure_space(mm(h_mm + BLOCK_SLACK_MM))
    }

    fn bind_toc(&mut self, title: &str) {
        if let Some(target) = self.cursor.next(title) {
            self.surface.bind(target);
        }
    }

    fn component_link(&self, name: &str) -> Option<LinkTarget> {
        self.links.component(self.current_tag, name)
    }

    fn full_cell(&mut self, h_mm: f32, text: &str, style: CellStyle) {
        let w = self.content_width();
        self.surface.cell(w, mm(h_mm), text, style, Flow::NextLine);
    }

    fn paragraph(&mut self, line_mm: f32, text: &str) {
        let w = self.content_width();
        self.surface.multi_cell(w, mm(line_mm), text, CellStyle::default());
    }

    fn title_page(&mut self, doc: &Document) {
        self.surface.add_page();

        self.surface.set_font(FontStyle::Bold, 28.0);
        self.surface.ln(mm(40.0));
        self.full_cell(15.0, &doc.title, CellStyle::aligned(Align::Center));
        self.surface.ln(mm(5.0));

        self.surface.set_font(FontStyle::Regular, 14.0);
        self.surface.set_text_color(MUTED);
        let version = format!("Version {}", doc.version);
        self.full_cell(8.0, &version, CellStyle::aligned(Align::Center));
        self.surface.set_text_color(BLACK);
        self.surface.ln(mm(20.0));

        if !doc.description.is_empty() {
            self.surface.set_font(FontStyle::Regular, 11.0);
            let w = self.content_width();
            let desc = strip_html(&doc.description);
            self.surface
                .multi_cell(w, mm(6.0), &desc, CellStyle::aligned(Align::Center));
        }

        self.surface.ln(mm(30.0));
        self.surface.set_font(FontStyle::Regular, 10.0);
        self.surface.set_text_color(GRAY);
        self.full_cell(
            6.0,
            "OpenAPI Specification Document",
            CellStyle::aligned(Align::Center),
        );
        self.surface.set_text_color(BLACK);
    }

    fn table_of_contents(&mut self) {
        self.surface.add_page();
        self.surface.set_font(FontStyle::Bold, 20.0);
        self.full_cell(10.0, "Table of Contents", CellStyle::default());
        self.surface.ln(mm(8.0));

        let line_h = mm(5.0);
        let page_col = mm(TOC_PAGE_COL_MM);
        let width = self.content_width();
        let toc = self.toc;
        for entry in toc {
            let indent = mm((entry.level.saturating_sub(1)) as f32 * 8.0);
            match entry.level {
                1 => self.surface.set_font(FontStyle::Bold, 12.0),
                2 => self.surface.set_font(FontStyle::Bold, 10.0),
                _ => self.surface.set_font(FontStyle::Regular, 9.0),
            }
            let link = CellStyle::linked(Some(entry.target));
            let title = entry.display_title();
            let page = self
                .page_numbers
                .and_then(|pages| pages.get(&entry.target))
                .map(|p| p.to_string())
                .unwrap_or_default();

            self.surface.set_x(self.left() + indent);
            self.surface
                .cell(width - indent - page_col, line_h, &title, link, Flow::Right);
            let number = CellStyle {
                align: Align::Right,
                ..link
            };
            self.surface.cell(page_col, line_h, &page, number, Flow::NextLine);
        }
    }

    fn section_header(&mut self, title: &str) {
        self.surface.set_font(FontStyle::Bold, 18.0);
        self.full_cell(10.0, title, CellStyle::default());
        self.surface.ln(mm(4.0));
    }

    fn sub_header(&mut self, title: &str) {
        self.surface.set_font(FontStyle::Bold, 10.0);
        self.surface.set_text_color(SUBHEAD);
        self.full_cell(6.0, title, CellStyle::default());
        self.surface.set_text_color(BLACK);
    }

    fn overview(&mut self, doc: &Document) {
        self.surface.add_page();
        self.bind_toc("Overview");
        self.section_header("Overview");

        if !doc.description.is_empty() {
            self.surface.set_font(FontStyle::Regular, 10.0);
            self.paragraph(5.0, &strip_html(&doc.description));
            self.surface.ln(mm(4.0));
        }
    }

    fn servers(&mut self, doc: &Document) {
        self.ensure_block(40.0);
        self.bind_toc("Servers");
        self.section_header("Servers");

        for server in &doc.servers {
            self.surface.set_font(FontStyle::Bold, 10.0);
            self.surface.set_text_color(LINK_BLUE);
            self.full_cell(6.0, &server.url, CellStyle::default());
            self.surface.set_text_color(BLACK);

            if !server.description.is_empty() {
                self.surface.set_font(FontStyle::Regular, 9.0);
                self.surface.set_text_color(MUTED);
                self.paragraph(4.0, &strip_html(&server.description));
                self.surface.set_text_color(BLACK);
            }
            self.surface.ln(mm(2.0));
        }
        self.surface.ln(mm(4.0));
    }

    fn endpoints_header(&mut self) {
        self.surface.add_page();
        self.bind_toc("API Endpoints");
        self.section_header("API Endpoints");
        self.surface.ln(mm(4.0));
    }

    fn tag_section(&mut self, tag: &'p TagSection<'a>) {
        self.surface.add_page();
        self.bind_toc(&tag.name);
        self.current_tag = &tag.name;

        self.surface.set_font(FontStyle::Bold, 14.0);
        self.surface.set_fill_color([240, 240, 240]);
        let fill = CellStyle {
            fill: true,
            ..Default::default()
        };
        self.full_cell(8.0, &tag.name, fill);
        self.surface.ln(mm(4.0));

        if let Some(desc) = tag.description {
            self.surface.set_font(FontStyle::Regular, 10.0);
            self.paragraph(5.0, &strip_html(desc));
            self.surface.ln(mm(4.0));
        }

        let targets: Vec<LinkTarget> = self
            .cursor
            .upcoming()
            .iter()
            .take(tag.endpoints.len())
            .map(|e| e.target)
            .collect();
        self.endpoints_summary(&tag.endpoints, &targets);
        self.surface.ln(mm(6.0));

        for ep in &tag.endpoints {
            self.ensure_block(50.0);
            self.bind_toc(&ep.title());
            self.endpoint(ep);
        }

        if !tag.components.is_empty() {
            self.surface.ln(mm(6.0));
            self.surface.separator(BORDER);
            self.surface.ln(mm(6.0));
            self.objects_used(tag);
        }

        self.surface.ln(mm(4.0));
    }

    fn endpoints_summary(&mut self, endpoints: &[EndpointRef<'_>], targets: &[LinkTarget]) {
        if endpoints.is_empty() {
            return;
        }
        self.surface.set_font(FontStyle::Bold, 11.0);
        self.full_cell(6.0, "Endpoints in this section", CellStyle::default());
        self.surface.ln(mm(2.0));

        let rows: Vec<Vec<TableCell>> = endpoints
            .iter()
            .enumerate()
            .map(|(i, ep)| {
                let link = targets.get(i).copied();
                let summary = strip_html(&ep.operation.summary);
                vec![
                    TableCell::linked(truncate(&summary, TOC_TITLE_LIMIT), link),
                    TableCell::linked(ep.path, link),
                    TableCell::linked(ep.method, link),
                ]
            })
            .collect();
        table::render_table(&mut self.surface, &table::SUMMARY, &rows);
    }

    fn endpoint(&mut self, ep: &EndpointRef<'_>) {
        let op = ep.operation;
        let w = self.content_width();

        self.surface.set_font(FontStyle::Bold, 11.0);
        self.surface.set_fill_color(method_color(&op.method));
        self.surface.set_text_color(WHITE);
        let badge_w = mm(op.method.len() as f32 * 3.0 + 8.0);
        let badge = CellStyle {
            align: Align::Center,
            fill: true,
            ..Default::default()
        };
        self.surface.cell(badge_w, mm(7.0), &op.method, badge, Flow::Right);
        self.surface.set_text_color(BLACK);
        let path = format!(" {}", ep.path);
        self.surface
            .cell(w - badge_w, mm(7.0), &path, CellStyle::default(), Flow::NextLine);
        self.surface.ln(mm(2.0));

        if !op.operation_id.is_empty() {
            self.surface.set_font(FontStyle::Regular, 8.0);
            self.surface.set_text_color(GRAY);
            let id = format!("Operation ID: {}", op.operation_id);
            self.full_cell(4.0, &id, CellStyle::default());
            self.surface.set_text_color(BLACK);
        }
        if !op.summary.is_empty() {
            self.surface.set_font(FontStyle::Bold, 10.0);
            self.paragraph(5.0, &strip_html(&op.summary));
        }
        if !op.description.is_empty() {
            self.surface.set_font(FontStyle::Regular, 9.0);
            self.paragraph(4.0, &strip_html(&op.description));
        }
        self.surface.ln(mm(2.0));

        self.operation_details(op);

        self.surface.ln(mm(2.0));
        self.surface.separator(RULE);
        self.surface.ln(mm(6.0));
    }

    fn operation_details(&mut self, op: &Operation) {
        if !op.parameters.is_empty() {
            self.sub_header("Parameters");
            self.parameter_table(&op.parameters);
        }
        if let Some(body) = &op.request_body {
            self.sub_header("Request Body");
            self.request_body(body);
        }
        if !op.responses.is_empty() {
            self.sub_header("Responses");
            self.response_table(&op.responses);
        }
    }

    fn parameter_table(&mut self, params: &[Parameter]) {
        let rows: Vec<Vec<TableCell>> = params
            .iter()
            .map(|p| {
                let (label, target) = object_label(&p.schema);
                let link = target.and_then(|name| self.component_link(name));
                vec![
                    TableCell::plain(p.name.as_str()),
                    TableCell::plain(p.location.as_str()),
                    TableCell::plain(if p.required { "Yes" } else { "No" }),
                    TableCell::linked(label, link),
                    TableCell::plain(strip_html(&p.description)),
                ]
            })
            .collect();
        table::render_table(&mut self.surface, &table::PARAMETERS, &rows);
        self.surface.ln(mm(3.0));
    }

    fn request_body(&mut self, body: &RequestBody) {
        if body.required {
            self.surface.set_font(FontStyle::Italic, 9.0);
            self.surface.set_text_color(SUBHEAD);
            self.full_cell(5.0, "Required", CellStyle::default());
            self.surface.set_text_color(BLACK);
        }
        if !body.description.is_empty() {
            self.surface.set_font(FontStyle::Regular, 9.0);
            self.paragraph(4.0, &strip_html(&body.description));
        }

        if !body.content.is_empty() {
            self.surface.ln(mm(2.0));
            let rows: Vec<Vec<TableCell>> = body
                .content
                .iter()
                .map(|(content_type, media)| {
                    let (mut label, target) = object_label(&media.schema);
                    if label.is_empty() {
                        label = "Object".to_string();
                    }
                    let link = target.and_then(|name| self.component_link(name));
                    vec![
                        TableCell::plain(content_type.as_str()),
                        TableCell::linked(label, link),
                    ]
                })
                .collect();
            table::render_table(&mut self.surface, &table::REQUEST_BODY, &rows);

            for (content_type, media) in &body.content {
                let schema = &media.schema;
                if schema.ref_name().is_none()
                    && (!schema.properties.is_empty() || schema.items.is_some())
                {
                    self.surface.ln(mm(2.0));
                    self.surface.set_font(FontStyle::Italic, 8.0);
                    self.full_cell(4.0, &format!("Schema ({content_type}):"), CellStyle::default());
                    self.schema_info(schema, 1);
                }
            }

            let examples: Vec<(String, &Value)> = body
                .content
                .iter()
                .flat_map(|(content_type, media)| media_examples(content_type, media))
                .collect();
            if !examples.is_empty() {
                self.surface.ln(mm(4.0));
                self.sub_header("Request Examples");
                for (title, value) in examples {
                    self.example(&title, value);
                }
            }
        }
        self.surface.ln(mm(2.0));
    }

    /// Indented outline of an inline schema. References are shown as links
    /// and never expanded, so the walk is bounded by the inline tree.
    fn schema_info(&mut self, schema: &Schema, indent: usize) {
        self.surface.set_font(FontStyle::Regular, 8.0);
        let pad = "  ".repeat(indent);

        if let Some(name) = schema.ref_name() {
            let link = self.component_link(name);
            self.surface
                .set_text_color(if link.is_some() { LINK_BLUE } else { BLACK });
            self.full_cell(4.0, &format!("{pad}Object: {name}"), CellStyle::linked(link));
            self.surface.set_text_color(BLACK);
            return;
        }

        let type_label = schema.type_label();
        if !type_label.is_empty() && type_label != "object" {
            self.full_cell(4.0, &format!("{pad}Type: {type_label}"), CellStyle::default());
        }

        if !schema.description.is_empty() {
            let indent_w = self.surface.string_width(&pad);
            let w = self.content_width() - indent_w;
            self.surface.set_x(self.left() + indent_w);
            self.surface
                .multi_cell(w, mm(4.0), &strip_html(&schema.description), CellStyle::default());
        }

        if !schema.properties.is_empty() {
            self.full_cell(4.0, &format!("{pad}Properties:"), CellStyle::default());
            for (name, prop) in &schema.properties {
                let (label, target) = object_label(prop);
                let link = target.and_then(|n| self.component_link(n));
                self.surface
                    .set_text_color(if link.is_some() { LINK_BLUE } else { BLACK });
                self.full_cell(
                    4.0,
                    &format!("{pad}  - {name}: {label}"),
                    CellStyle::linked(link),
                );
                self.surface.set_text_color(BLACK);
            }
        }

        if let Some(items) = &schema.items {
            self.full_cell(4.0, &format!("{pad}Items:"), CellStyle::default());
            self.schema_info(items, indent + 1);
        }
    }

    fn response_table(&mut self, responses: &[Response]) {
        let mut sorted: Vec<&Response> = responses.iter().collect();
        sorted.sort_by(|a, b| a.status_code.cmp(&b.status_code));

        let rows: Vec<Vec<TableCell>> = sorted
            .iter()
            .map(|resp| {
                let mut label = String::new();
                let mut link = None;
                for media in resp.content.values() {
                    let (l, target) = object_label(&media.schema);
                    if let Some(name) = target {
                        label = l;
                        link = self.component_link(name);
                        break;
                    }
                    if !l.is_empty() {
                        label = l;
                    }
                }
                vec![
                    TableCell::plain(resp.status_code.as_str()),
                    TableCell::plain(strip_html(&resp.description)),
                    TableCell::linked(label, link),
                ]
            })
            .collect();
        table::render_table(&mut self.surface, &table::RESPONSES, &rows);

        let examples: Vec<(String, &Value)> = sorted
            .iter()
            .flat_map(|resp| {
                resp.content.iter().flat_map(move |(media_type, media)| {
                    media_examples(&format!("{} - {media_type}", resp.status_code), media)
                })
            })
            .collect();
        if !examples.is_empty() {
            self.surface.ln(mm(4.0));
            self.sub_header("Response Examples");
            for (title, value) in examples {
                self.example(&title, value);
            }
        }
        self.surface.ln(mm(3.0));
    }

    fn example(&mut self, title: &str, value: &Value) {
        self.ensure_block(30.0);

        self.surface.set_font(FontStyle::Italic, 9.0);
        self.surface.set_text_color(SUBHEAD);
        self.full_cell(6.0, &format!("Example ({title}):"), CellStyle::default());
        self.surface.set_text_color(BLACK);

        self.surface.set_font(FontStyle::Mono, 8.0);
        self.surface.set_fill_color([250, 250, 250]);
        let w = self.content_width();
        let lines = self.surface.split_preformatted(&example_text(value), w);
        let block = CellStyle {
            fill: true,
            border: true,
            ..Default::default()
        };
        self.surface.draw_lines(w, mm(4.0), &lines, block);
        self.surface.ln(mm(4.0));
    }

    fn objects_used(&mut self, tag: &TagSection<'_>) {
        self.surface.set_font(FontStyle::Bold, 11.0);
        self.surface.set_text_color(SUBHEAD);
        self.full_cell(6.0, "Objects Used", CellStyle::default());
        self.surface.set_text_color(BLACK);
        self.surface.ln(mm(2.0));

        let doc = self.plan.doc;
        for name in &tag.components {
            let Some(schema) = doc.components.get(name) else {
                continue;
            };
            self.ensure_block(30.0);
            if let Some(target) = self.component_link(name) {
                self.surface.bind(target);
            }
            self.component_schema(name, schema);
        }

        self.surface.ln(mm(2.0));
        self.surface.separator(BORDER);
        self.surface.ln(mm(6.0));
    }

    fn component_schema(&mut self, name: &str, schema: &Schema) {
        self.surface.set_font(FontStyle::Bold, 12.0);
        self.full_cell(7.0, name, CellStyle::default());

        let type_label = schema.type_label();
        if !type_label.is_empty() && type_label != "object" {
            self.surface.set_font(FontStyle::Regular, 9.0);
            self.full_cell(5.0, &format!("Type: {type_label}"), CellStyle::default());
        }

        if !schema.description.is_empty() {
            self.surface.set_font(FontStyle::Regular, 9.0);
            self.surface.set_text_color(MUTED);
            self.paragraph(4.0, &strip_html(&schema.description));
            self.surface.set_text_color(BLACK);
        }

        if !schema.properties.is_empty() {
            self.surface.ln(mm(2.0));
            self.surface.set_font(FontStyle::Bold, 9.0);
            self.surface.set_fill_color([245, 245, 245]);
            let caption = CellStyle {
                align: Align::Center,
                fill: true,
                border: true,
                link: None,
            };
            self.surface.ensure_space(mm(6.0 + 5.0 + 5.0));
            self.full_cell(6.0, name, caption);

            let rows: Vec<Vec<TableCell>> = schema
                .properties
                .iter()
                .map(|(prop_name, prop)| {
                    let (label, target) = object_label(prop);
                    let link = target.and_then(|n| self.component_link(n));
                    vec![
                        TableCell::plain(prop_name.as_str()),
                        TableCell::linked(label, link),
                        TableCell::plain(strip_html(&prop.description)),
                    ]
                })
                .collect();
            table::render_table(&mut self.surface, &table::PROPERTIES, &rows);
        }

        self.surface.ln(mm(6.0));
    }
}

/// The single `example` first, then named `examples` in name order.
fn media_examples<'m>(title: &str, media: &'m MediaType) -> Vec<(String, &'m Value)> {
    let mut out = Vec::with_capacity(1 + media.examples.len());
    if let Some(example) = &media.example {
        out.push((title.to_string(), example));
    }
    for (name, example) in &media.examples {
        out.push((format!("{title} ({name})"), example));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_reference_reads_as_slice_and_links_to_item() {
        let mut schema = Schema::of_type("array");
        schema.items = Some(Box::new(Schema::named("#/components/schemas/Pet")));
        assert_eq!(object_label(&schema), ("[]Pet".to_string(), Some("Pet")));

        let mut plain = Schema::of_type("array");
        plain.items = Some(Box::new(Schema::of_type("string")));
        assert_eq!(object_label(&plain), ("[]string".to_string(), None));
    }

    #[test]
    fn unknown_methods_fall_back_to_gray() {
        assert_eq!(method_color("TRACE"), GRAY);
        assert_eq!(method_color("GET"), [97, 175, 254]);
    }
}
