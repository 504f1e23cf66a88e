use crate::config::MM;
use crate::fonts::FontStyle;

use super::links::LinkTarget;
use super::surface::{Align, BLACK, CellStyle, Color, Surface};

/// Text colour of cells that jump somewhere.
pub(super) const LINK_BLUE: Color = [0, 102, 204];

const HEADER_FILL: Color = [245, 245, 245];

/// Line height of wrapped body cells, in mm.
const ROW_LINE_MM: f32 = 5.0;

pub(super) struct Column {
    title: &'static str,
    /// Nominal width in mm on a 190 mm content area; scaled to the real one.
    width_mm: f32,
    align: Align,
}

const fn col(title: &'static str, width_mm: f32, align: Align) -> Column {
    Column {
        title,
        width_mm,
        align,
    }
}

pub(super) struct Table {
    columns: &'static [Column],
    font_size: f32,
    header_mm: f32,
}

pub(super) const PARAMETERS: Table = Table {
    columns: &[
        col("Name", 35.0, Align::Left),
        col("In", 20.0, Align::Left),
        col("Required", 15.0, Align::Center),
        col("Type", 60.0, Align::Left),
        col("Description", 60.0, Align::Left),
    ],
    font_size: 8.0,
    header_mm: 6.0,
};

pub(super) const REQUEST_BODY: Table = Table {
    columns: &[
        col("Content-Type", 60.0, Align::Left),
        col("Object", 130.0, Align::Left),
    ],
    font_size: 8.0,
    header_mm: 6.0,
};

pub(super) const RESPONSES: Table = Table {
    columns: &[
        col("Status", 25.0, Align::Center),
        col("Description", 95.0, Align::Left),
        col("Object", 70.0, Align::Left),
    ],
    font_size: 8.0,
    header_mm: 6.0,
};

pub(super) const PROPERTIES: Table = Table {
    columns: &[
        col("Name", 50.0, Align::Left),
        col("Type", 50.0, Align::Left),
        col("Description", 90.0, Align::Left),
    ],
    font_size: 8.0,
    header_mm: 5.0,
};

pub(super) const SUMMARY: Table = Table {
    columns: &[
        col("Summary", 100.0, Align::Left),
        col("Path", 75.0, Align::Left),
        col("Method", 15.0, Align::Center),
    ],
    font_size: 9.0,
    header_mm: 6.0,
};

impl Table {
    fn column_widths(&self, content_width: f32) -> Vec<f32> {
        let nominal: f32 = self.columns.iter().map(|c| c.width_mm).sum();
        self.columns
            .iter()
            .map(|c| c.width_mm / nominal * content_width)
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub(super) struct TableCell {
    pub(super) text: String,
    pub(super) link: Option<LinkTarget>,
}

impl TableCell {
    pub(super) fn plain(text: impl Into<String>) -> Self {
        TableCell {
            text: text.into(),
            link: None,
        }
    }

    pub(super) fn linked(text: impl Into<String>, link: Option<LinkTarget>) -> Self {
        TableCell {
            text: text.into(),
            link,
        }
    }
}

struct RowLayout {
    height: f32,
    cell_lines: Vec<Vec<String>>,
}

fn measure_row(surface: &Surface, widths: &[f32], row: &[TableCell]) -> RowLayout {
    let cell_lines: Vec<Vec<String>> = row
        .iter()
        .zip(widths)
        .map(|(cell, &w)| surface.split_lines(&cell.text, w))
        .collect();
    let max_lines = cell_lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
    RowLayout {
        height: max_lines as f32 * ROW_LINE_MM * MM,
        cell_lines,
    }
}

fn draw_header(surface: &mut Surface, table: &Table, widths: &[f32]) {
    let h = table.header_mm * MM;
    let left = surface.geometry().margins.left;
    let y = surface.y();
    surface.set_font(FontStyle::Bold, table.font_size);
    surface.set_fill_color(HEADER_FILL);
    surface.set_text_color(BLACK);
    let mut x = left;
    for (column, &w) in table.columns.iter().zip(widths) {
        let style = CellStyle {
            fill: true,
            border: true,
            ..Default::default()
        };
        surface.draw_cell(x, y, w, h, column.title, style);
        x += w;
    }
    surface.set_xy(left, y + h);
    surface.set_font(FontStyle::Regular, table.font_size);
}

fn draw_row(surface: &mut Surface, table: &Table, widths: &[f32], row: &[TableCell], layout: &RowLayout) {
    let line_h = ROW_LINE_MM * MM;
    let left = surface.geometry().margins.left;
    let top = surface.y();
    let mut x = left;

    for ((cell, lines), (column, &w)) in row
        .iter()
        .zip(&layout.cell_lines)
        .zip(table.columns.iter().zip(widths))
    {
        surface.set_text_color(if cell.link.is_some() { LINK_BLUE } else { BLACK });
        for (i, line) in lines.iter().enumerate() {
            let y = top + i as f32 * line_h;
            surface.draw_cell(x, y, w, line_h, line, CellStyle::aligned(column.align));
        }
        if let Some(target) = cell.link {
            surface.link_area(x, top, w, layout.height, target);
        }
        surface.stroke_rect(x, top, w, layout.height);
        x += w;
    }

    surface.set_text_color(BLACK);
    surface.set_xy(left, top + layout.height);
}

/// Draw a bordered table at the cursor.
///
/// Every row is measured before it is drawn; a row that would cross the
/// bottom limit moves to a new page, and the column header is repeated there
/// when header and row fit together. A row that only fits the page on its
/// own starts the page without the header.
pub(super) fn render_table(surface: &mut Surface, table: &Table, rows: &[Vec<TableCell>]) {
    let widths = table.column_widths(surface.geometry().content_width());
    let header_h = table.header_mm * MM;
    surface.set_font(FontStyle::Regular, table.font_size);
    let layouts: Vec<RowLayout> = rows
        .iter()
        .map(|row| measure_row(surface, &widths, row))
        .collect();

    let first_h = layouts.first().map_or(0.0, |l| l.height);
    surface.ensure_space(header_h + first_h);
    draw_header(surface, table, &widths);

    for (ri, (row, layout)) in rows.iter().zip(&layouts).enumerate() {
        log::debug!(
            "TABLE row={} row_h={:.2} y={:.2}",
            ri,
            layout.height,
            surface.y()
        );
        if surface.ensure_space(layout.height) {
            let room = surface.geometry().bottom_limit() - surface.y();
            if header_h + layout.height <= room {
                draw_header(surface, table, &widths);
            } else {
                log::debug!("TABLE row={} leaves no room for the header", ri);
            }
        }
        draw_row(surface, table, &widths, row, layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PdfOptions;
    use crate::fonts::FontBook;
    use crate::pdf::links::LinkRegistry;
    use crate::pdf::surface::PageGeometry;

    fn surface() -> Surface {
        let geometry = PageGeometry::from_options(&PdfOptions::default()).unwrap();
        let mut s = Surface::new(geometry, FontBook::base14());
        s.add_page();
        s
    }

    #[test]
    fn widths_fill_the_content_area() {
        let total: f32 = PARAMETERS.column_widths(500.0).iter().sum();
        assert!((total - 500.0).abs() < 1e-3);
    }

    #[test]
    fn row_crossing_the_bottom_moves_with_a_fresh_header() {
        let mut s = surface();
        let limit = s.geometry().bottom_limit();
        let top = s.geometry().margins.top;
        let mut links = LinkRegistry::new();
        let target = links.new_link();
        s.bind(target);

        let rows: Vec<Vec<TableCell>> = (0..60)
            .map(|i| {
                vec![
                    TableCell::plain(format!("field_{i}")),
                    TableCell::linked("Widget", Some(target)),
                    TableCell::plain("a description long enough to wrap onto a second line of the cell"),
                ]
            })
            .collect();
        s.set_xy(s.geometry().margins.left, top + 100.0);
        render_table(&mut s, &PROPERTIES, &rows);

        let record = s.record();
        assert!(record.page_count >= 2);
        assert!(record.deepest_y <= limit + 0.01);
        assert_eq!(
            record.placed_links.iter().filter(|l| l.target == target).count(),
            60
        );
    }

    #[test]
    fn row_filling_a_page_moves_without_the_header() {
        let mut s = surface();
        let limit = s.geometry().bottom_limit();
        let top = s.geometry().margins.top;
        let tall = format!("{}x", "x\n".repeat(52));
        let rows = vec![
            vec![TableCell::plain("id"), TableCell::plain("integer"), TableCell::plain("")],
            vec![TableCell::plain("notes"), TableCell::plain("string"), TableCell::plain(tall)],
        ];
        let row_h = 53.0 * ROW_LINE_MM * MM;
        assert!(row_h <= limit - top);
        assert!(row_h + PROPERTIES.header_mm * MM > limit - top);

        s.set_xy(s.geometry().margins.left, limit - 60.0);
        render_table(&mut s, &PROPERTIES, &rows);

        let record = s.record();
        assert_eq!(record.page_count, 2);
        assert!(record.deepest_y <= limit + 0.01, "deepest {} limit {}", record.deepest_y, limit);
        assert!((s.y() - (top + row_h)).abs() < 0.01);
    }
}
