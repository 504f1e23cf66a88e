use std::collections::HashMap;

use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::config::{Margins, PdfOptions};
use crate::error::Error;
use crate::fonts::{FontBook, FontStyle};

use super::links::LinkTarget;

pub(super) type Color = [u8; 3];

pub(super) const BLACK: Color = [0, 0, 0];

/// Horizontal padding inside a cell, each side.
const CELL_PAD: f32 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct PageGeometry {
    pub(super) width: f32,
    pub(super) height: f32,
    pub(super) margins: Margins,
}

impl PageGeometry {
    pub(super) fn from_options(options: &PdfOptions) -> Result<Self, Error> {
        let (width, height) = options.page_size.dimensions();
        let m = options.margins;
        if m.left + m.right >= width || m.top + m.bottom >= height {
            return Err(Error::InvalidPageGeometry { width, height });
        }
        Ok(PageGeometry {
            width,
            height,
            margins: m,
        })
    }

    pub(super) fn content_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Nothing is drawn below this y (measured from the page top).
    pub(super) fn bottom_limit(&self) -> f32 {
        self.height - self.margins.bottom
    }
}

/// Where the cursor goes after a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Flow {
    Right,
    NextLine,
}

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct CellStyle {
    pub(super) align: Align,
    pub(super) fill: bool,
    pub(super) border: bool,
    pub(super) link: Option<LinkTarget>,
}

impl CellStyle {
    pub(super) fn aligned(align: Align) -> Self {
        CellStyle {
            align,
            ..Default::default()
        }
    }

    pub(super) fn linked(link: Option<LinkTarget>) -> Self {
        CellStyle {
            link,
            ..Default::default()
        }
    }
}

/// Page position a link target was bound to. `page` is 0-based, `y` from the top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Destination {
    pub page: usize,
    pub y: f32,
}

/// A clickable region as placed on a page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedLink {
    pub page: usize,
    pub target: LinkTarget,
}

struct PageLink {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    target: LinkTarget,
}

struct Page {
    content: Content,
    links: Vec<PageLink>,
}

/// What one layout pass produced, independent of the PDF bytes.
#[derive(Clone, Debug, Default)]
pub(super) struct LayoutRecord {
    pub(super) page_count: usize,
    pub(super) destinations: HashMap<LinkTarget, Destination>,
    pub(super) bind_order: Vec<LinkTarget>,
    pub(super) placed_links: Vec<PlacedLink>,
    pub(super) deepest_y: f32,
}

/// Cursor-based drawing canvas over fixed-size pages.
///
/// Coordinates are points with `y` growing downwards from the page top; the
/// flip to PDF user space happens only when content is emitted.
pub(super) struct Surface {
    geometry: PageGeometry,
    fonts: FontBook,
    pages: Vec<Page>,
    x: f32,
    y: f32,
    font: FontStyle,
    font_size: f32,
    text_color: Color,
    fill_color: Color,
    draw_color: Color,
    destinations: HashMap<LinkTarget, Destination>,
    bind_order: Vec<LinkTarget>,
    deepest_y: f32,
}

impl Surface {
    pub(super) fn new(geometry: PageGeometry, fonts: FontBook) -> Self {
        Surface {
            x: geometry.margins.left,
            y: geometry.margins.top,
            geometry,
            fonts,
            pages: Vec::new(),
            font: FontStyle::Regular,
            font_size: 10.0,
            text_color: BLACK,
            fill_color: [255, 255, 255],
            draw_color: [180, 180, 180],
            destinations: HashMap::new(),
            bind_order: Vec::new(),
            deepest_y: 0.0,
        }
    }

    pub(super) fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub(super) fn add_page(&mut self) {
        self.pages.push(Page {
            content: Content::new(),
            links: Vec::new(),
        });
        self.x = self.geometry.margins.left;
        self.y = self.geometry.margins.top;
        log::debug!("page {} started", self.pages.len());
    }

    pub(super) fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_mut(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.add_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn current_page(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    pub(super) fn y(&self) -> f32 {
        self.y
    }

    pub(super) fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    pub(super) fn set_xy(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// Move to the left margin, `h` further down.
    pub(super) fn ln(&mut self, h: f32) {
        self.x = self.geometry.margins.left;
        self.y += h;
    }

    pub(super) fn at_page_top(&self) -> bool {
        (self.y - self.geometry.margins.top).abs() < 0.5
    }

    /// Break the page when a block of height `h` would cross the bottom limit.
    /// The horizontal position survives the break. Returns whether a page was added.
    pub(super) fn ensure_space(&mut self, h: f32) -> bool {
        if self.pages.is_empty() {
            self.add_page();
            return true;
        }
        if self.y + h <= self.geometry.bottom_limit() || self.at_page_top() {
            return false;
        }
        log::debug!(
            "page break before block h={h:.1} at y={:.1} (limit {:.1})",
            self.y,
            self.geometry.bottom_limit()
        );
        let x = self.x;
        self.add_page();
        self.x = x;
        true
    }

    pub(super) fn set_font(&mut self, style: FontStyle, size: f32) {
        self.font = style;
        self.font_size = size;
    }

    pub(super) fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    pub(super) fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    pub(super) fn string_width(&self, text: &str) -> f32 {
        self.fonts.text_width(self.font, self.font_size, text)
    }

    /// Word-wrap `text` for a cell of `width`, honouring explicit newlines.
    /// Always yields at least one (possibly empty) line.
    pub(super) fn split_lines(&self, text: &str, width: f32) -> Vec<String> {
        let avail = (width - 2.0 * CELL_PAD).max(1.0);
        let space_w = self.string_width(" ");
        let mut out = Vec::new();

        for para in text.split('\n') {
            let mut current = String::new();
            let mut current_w = 0.0f32;
            for word in para.split_whitespace() {
                let ww = self.string_width(word);
                let proposed = if current.is_empty() {
                    ww
                } else {
                    current_w + space_w + ww
                };
                if proposed <= avail {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(word);
                    current_w = proposed;
                    continue;
                }
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                current_w = 0.0;
                if ww <= avail {
                    current.push_str(word);
                    current_w = ww;
                } else {
                    self.hard_wrap_into(word, avail, &mut current, &mut current_w, &mut out);
                }
            }
            out.push(current);
        }
        out
    }

    /// Split preformatted text at newlines and at the cell width, keeping
    /// leading whitespace intact.
    pub(super) fn split_preformatted(&self, text: &str, width: f32) -> Vec<String> {
        let avail = (width - 2.0 * CELL_PAD).max(1.0);
        let mut out = Vec::new();
        for line in text.lines() {
            let mut current = String::new();
            let mut current_w = 0.0f32;
            self.hard_wrap_into(line, avail, &mut current, &mut current_w, &mut out);
            out.push(current);
        }
        if out.is_empty() {
            out.push(String::new());
        }
        out
    }

    fn hard_wrap_into(
        &self,
        text: &str,
        avail: f32,
        current: &mut String,
        current_w: &mut f32,
        out: &mut Vec<String>,
    ) {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let cw = self.string_width(ch.encode_utf8(&mut buf));
            if !current.is_empty() && *current_w + cw > avail {
                out.push(std::mem::take(current));
                *current_w = 0.0;
            }
            current.push(ch);
            *current_w += cw;
        }
    }

    /// Draw one single-line cell at the cursor, breaking the page first if it
    /// would not fit.
    pub(super) fn cell(&mut self, w: f32, h: f32, text: &str, style: CellStyle, flow: Flow) {
        self.ensure_space(h);
        let (x, y) = (self.x, self.y);
        self.draw_cell(x, y, w, h, text, style);
        match flow {
            Flow::Right => self.x += w,
            Flow::NextLine => self.ln(h),
        }
    }

    /// Draw a cell at an explicit position without moving the cursor or
    /// checking for page breaks.
    pub(super) fn draw_cell(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, style: CellStyle) {
        if style.fill {
            self.fill_rect(x, y, w, h);
        }
        if style.border {
            self.stroke_rect(x, y, w, h);
        }
        if !text.is_empty() {
            let tw = self.string_width(text);
            let tx = match style.align {
                Align::Left => x + CELL_PAD,
                Align::Center => x + (w - tw) / 2.0,
                Align::Right => x + w - CELL_PAD - tw,
            };
            let baseline = y + 0.5 * h + 0.3 * self.font_size;
            self.draw_text(tx, baseline, text);
        }
        if let Some(target) = style.link {
            self.link_area(x, y, w, h, target);
        }
        self.deepest_y = self.deepest_y.max(y + h);
    }

    /// Wrapped text in a column of width `w` starting at the cursor; pages
    /// break between lines. Returns the height consumed on the last page.
    pub(super) fn multi_cell(&mut self, w: f32, line_h: f32, text: &str, style: CellStyle) -> f32 {
        let lines = self.split_lines(text, w);
        self.draw_lines(w, line_h, &lines, style)
    }

    /// Lines already split by the caller, drawn like [`Surface::multi_cell`].
    /// A bordered block is closed at each page break and reopened on the next page.
    pub(super) fn draw_lines(&mut self, w: f32, line_h: f32, lines: &[String], style: CellStyle) -> f32 {
        let x = self.x;
        let mut consumed = 0.0;
        let mut first_on_page = true;
        for (i, line) in lines.iter().enumerate() {
            if self.ensure_space(line_h) {
                first_on_page = true;
                consumed = 0.0;
            }
            self.x = x;
            let y = self.y;
            let line_style = CellStyle {
                border: false,
                ..style
            };
            self.draw_cell(x, y, w, line_h, line, line_style);
            if style.border {
                self.line(x, y, x, y + line_h);
                self.line(x + w, y, x + w, y + line_h);
                if first_on_page {
                    self.line(x, y, x + w, y);
                }
                let last = i + 1 == lines.len();
                let breaks_next = y + 2.0 * line_h > self.geometry.bottom_limit();
                if last || breaks_next {
                    self.line(x, y + line_h, x + w, y + line_h);
                }
            }
            first_on_page = false;
            self.y += line_h;
            consumed += line_h;
        }
        self.x = self.geometry.margins.left;
        consumed
    }

    fn draw_text(&mut self, x: f32, baseline: f32, text: &str) {
        let style = self.font;
        let size = self.font_size;
        let [r, g, b] = self.text_color;
        let pdf_y = self.geometry.height - baseline;
        let font_name = self.fonts.pdf_name(style).to_string();
        let bytes = self.fonts.encode(style, text);
        let content = &mut self.page_mut().content;
        content.begin_text();
        content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        content.set_font(Name(font_name.as_bytes()), size);
        content.next_line(x, pdf_y);
        content.show(Str(&bytes));
        content.end_text();
    }

    pub(super) fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let [r, g, b] = self.fill_color;
        let pdf_y = self.geometry.height - y - h;
        let content = &mut self.page_mut().content;
        content.save_state();
        content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        content.rect(x, pdf_y, w, h);
        content.fill_nonzero();
        content.restore_state();
        self.deepest_y = self.deepest_y.max(y + h);
    }

    pub(super) fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let [r, g, b] = self.draw_color;
        let pdf_y = self.geometry.height - y - h;
        let content = &mut self.page_mut().content;
        content.save_state();
        content.set_line_width(0.5);
        content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        content.rect(x, pdf_y, w, h);
        content.stroke();
        content.restore_state();
        self.deepest_y = self.deepest_y.max(y + h);
    }

    pub(super) fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let [r, g, b] = self.draw_color;
        let page_h = self.geometry.height;
        let content = &mut self.page_mut().content;
        content.save_state();
        content.set_line_width(0.5);
        content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        content.move_to(x1, page_h - y1);
        content.line_to(x2, page_h - y2);
        content.stroke();
        content.restore_state();
        self.deepest_y = self.deepest_y.max(y1.max(y2));
    }

    /// Full-width horizontal rule at the cursor.
    pub(super) fn separator(&mut self, color: Color) {
        self.ensure_space(1.0);
        let saved = self.draw_color;
        self.draw_color = color;
        let left = self.geometry.margins.left;
        let y = self.y;
        self.line(left, y, left + self.geometry.content_width(), y);
        self.draw_color = saved;
    }

    /// Bind `target` to the cursor's current page and height.
    pub(super) fn bind(&mut self, target: LinkTarget) {
        if self.pages.is_empty() {
            self.add_page();
        }
        let dest = Destination {
            page: self.current_page(),
            y: self.y,
        };
        if self.destinations.insert(target, dest).is_some() {
            log::warn!("link target {} bound twice", target.index());
        }
        self.bind_order.push(target);
    }

    /// Make the rectangle clickable, jumping to `target`.
    pub(super) fn link_area(&mut self, x: f32, y: f32, w: f32, h: f32, target: LinkTarget) {
        self.page_mut().links.push(PageLink { x, y, w, h, target });
    }

    pub(super) fn record(&self) -> LayoutRecord {
        LayoutRecord {
            page_count: self.pages.len(),
            destinations: self.destinations.clone(),
            bind_order: self.bind_order.clone(),
            placed_links: self
                .pages
                .iter()
                .enumerate()
                .flat_map(|(page, p)| {
                    p.links.iter().map(move |l| PlacedLink {
                        page,
                        target: l.target,
                    })
                })
                .collect(),
            deepest_y: self.deepest_y,
        }
    }

    /// Assemble the finished pages into a PDF byte stream.
    pub(super) fn finish(self) -> (Vec<u8>, LayoutRecord) {
        let record = self.record();
        let Surface {
            geometry,
            fonts,
            pages,
            destinations,
            ..
        } = self;

        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let font_pairs = fonts.write(&mut pdf, &mut alloc);

        let n = pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        let page_annot_refs: Vec<Vec<Ref>> = pages
            .iter()
            .map(|page| {
                page.links
                    .iter()
                    .filter_map(|link| {
                        let Some(dest) = destinations.get(&link.target) else {
                            log::warn!("link to unbound target {} dropped", link.target.index());
                            return None;
                        };
                        let annot_ref = alloc();
                        let rect = Rect::new(
                            link.x,
                            geometry.height - link.y - link.h,
                            link.x + link.w,
                            geometry.height - link.y,
                        );
                        let mut annot = pdf.annotation(annot_ref);
                        annot
                            .subtype(AnnotationType::Link)
                            .rect(rect)
                            .border(0.0, 0.0, 0.0, None);
                        annot
                            .action()
                            .action_type(ActionType::GoTo)
                            .destination()
                            .page(page_ids[dest.page])
                            .xyz(geometry.margins.left, geometry.height - dest.y, None);
                        Some(annot_ref)
                    })
                    .collect()
            })
            .collect();

        for (i, page) in pages.into_iter().enumerate() {
            let raw = page.content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, geometry.width, geometry.height))
                .parent(pages_id)
                .contents(content_ids[i]);
            if !page_annot_refs[i].is_empty() {
                page.annotations(page_annot_refs[i].iter().copied());
            }
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }

        (pdf.finish(), record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        let geometry = PageGeometry::from_options(&PdfOptions::default()).unwrap();
        let mut s = Surface::new(geometry, FontBook::base14());
        s.add_page();
        s
    }

    #[test]
    fn breaks_before_block_that_would_cross_bottom() {
        let mut s = surface();
        let limit = s.geometry().bottom_limit();
        s.set_xy(50.0, limit - 10.0);
        assert!(s.ensure_space(10.5));
        assert_eq!(s.page_count(), 2);
        assert_eq!(s.y(), s.geometry().margins.top);
        assert_eq!(s.x, 50.0);
    }

    #[test]
    fn block_that_fits_stays_on_page() {
        let mut s = surface();
        let limit = s.geometry().bottom_limit();
        s.set_xy(50.0, limit - 10.0);
        assert!(!s.ensure_space(10.0));
        assert_eq!(s.page_count(), 1);
    }

    #[test]
    fn oversize_block_at_page_top_does_not_loop() {
        let mut s = surface();
        assert!(!s.ensure_space(10_000.0));
        assert_eq!(s.page_count(), 1);
    }

    #[test]
    fn wraps_words_and_oversize_tokens() {
        let mut s = surface();
        s.set_font(FontStyle::Regular, 10.0);
        let lines = s.split_lines("alpha beta gamma delta", 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "alpha beta gamma delta");

        let long = "x".repeat(200);
        let lines = s.split_lines(&long, 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), long);

        assert_eq!(s.split_lines("", 60.0), vec![String::new()]);
    }

    #[test]
    fn preformatted_keeps_indentation() {
        let mut s = surface();
        s.set_font(FontStyle::Mono, 8.0);
        let lines = s.split_preformatted("{\n  \"a\": 1\n}", 200.0);
        assert_eq!(lines, vec!["{", "  \"a\": 1", "}"]);
    }

    #[test]
    fn multi_cell_never_draws_below_the_limit() {
        let mut s = surface();
        s.set_font(FontStyle::Regular, 10.0);
        let text = "word ".repeat(3000);
        s.multi_cell(s.geometry().content_width(), 14.0, &text, CellStyle::default());
        let record = s.record();
        assert!(record.page_count > 1);
        assert!(record.deepest_y <= s.geometry().bottom_limit() + 0.01);
    }

    #[test]
    fn bind_records_page_and_height() {
        let mut s = surface();
        let mut links = super::super::links::LinkRegistry::new();
        let t = links.new_link();
        s.ln(100.0);
        s.bind(t);
        let record = s.record();
        assert_eq!(record.bind_order, vec![t]);
        let dest = record.destinations[&t];
        assert_eq!(dest.page, 0);
        assert!((dest.y - (s.geometry().margins.top + 100.0)).abs() < 1e-3);
    }
}
