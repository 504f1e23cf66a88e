use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum FontStyle {
    Regular,
    Bold,
    Italic,
    Mono,
}

impl FontStyle {
    const ALL: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::Mono,
    ];

    fn index(self) -> usize {
        match self {
            FontStyle::Regular => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
            FontStyle::Mono => 3,
        }
    }

    fn base14_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Italic => "Helvetica-Oblique",
            FontStyle::Mono => "Courier",
        }
    }
}

/// Helvetica advance widths (1000 units/em) for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

/// Helvetica-Bold advance widths (1000 units/em) for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

fn base14_width_1000(style: FontStyle, byte: u8) -> f32 {
    if style == FontStyle::Mono {
        return 600.0;
    }
    let table = if style == FontStyle::Bold {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    match byte {
        32..=126 => table[(byte - 32) as usize] as f32,
        _ => 556.0,
    }
}

/// A TrueType face read once per conversion and shared by every layout pass.
#[derive(Clone)]
pub(crate) struct LoadedFace {
    family: String,
    data: Arc<Vec<u8>>,
    face_index: u32,
}

impl LoadedFace {
    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.face_index).ok()
    }
}

/// Faces resolved from the configured family. `None` slots use base-14.
#[derive(Clone, Default)]
pub(crate) struct FontSources {
    faces: [Option<LoadedFace>; 3],
}

impl FontSources {
    pub(crate) fn load(family: Option<&str>, extra_dirs: &[PathBuf]) -> Self {
        let Some(family) = family else {
            return FontSources::default();
        };
        let t0 = std::time::Instant::now();
        let index = scan_font_dirs(&font_directories(extra_dirs), family);

        let mut faces: [Option<LoadedFace>; 3] = Default::default();
        for (slot, (bold, italic)) in [(false, false), (true, false), (false, true)]
            .into_iter()
            .enumerate()
        {
            let found = index
                .get(&(bold, italic))
                .or_else(|| index.get(&(false, false)))
                .and_then(|(path, face_index)| {
                    let data = std::fs::read(path).ok()?;
                    Face::parse(&data, *face_index).ok()?;
                    Some(LoadedFace {
                        family: family.to_string(),
                        data: Arc::new(data),
                        face_index: *face_index,
                    })
                });
            if found.is_none() {
                log::warn!("Font not found: {family} bold={bold} italic={italic}, using Helvetica");
            }
            faces[slot] = found;
        }

        log::info!(
            "Font lookup for {family}: {:.1}ms, {} of 3 faces found",
            t0.elapsed().as_secs_f64() * 1000.0,
            faces.iter().filter(|f| f.is_some()).count(),
        );
        FontSources { faces }
    }

    /// A fresh book with no glyphs used yet.
    pub(crate) fn book(&self) -> FontBook {
        let entries = FontStyle::ALL
            .iter()
            .map(|&style| {
                let loaded = match style {
                    FontStyle::Mono => None,
                    _ => self.faces[style.index()].clone(),
                };
                let kind = match loaded {
                    Some(face) => FontKind::TrueType(Box::new(TrueTypeState::new(face))),
                    None => FontKind::Base14,
                };
                FontEntry {
                    pdf_name: format!("F{}", style.index() + 1),
                    style,
                    kind,
                }
            })
            .collect();
        FontBook { entries }
    }
}

struct TrueTypeState {
    face: LoadedFace,
    units: f32,
    remapper: subsetter::GlyphRemapper,
    char_to_gid: HashMap<char, u16>,
}

impl TrueTypeState {
    fn new(face: LoadedFace) -> Self {
        let units = face
            .face()
            .map(|f| f.units_per_em() as f32)
            .unwrap_or(1000.0);
        TrueTypeState {
            face,
            units,
            remapper: subsetter::GlyphRemapper::new(),
            char_to_gid: HashMap::new(),
        }
    }
}

enum FontKind {
    Base14,
    TrueType(Box<TrueTypeState>),
}

struct FontEntry {
    pdf_name: String,
    style: FontStyle,
    kind: FontKind,
}

/// The four fonts a document is drawn with, plus glyph usage for subsetting.
pub(crate) struct FontBook {
    entries: Vec<FontEntry>,
}

impl FontBook {
    pub(crate) fn base14() -> Self {
        FontSources::default().book()
    }

    fn entry(&self, style: FontStyle) -> &FontEntry {
        &self.entries[style.index()]
    }

    pub(crate) fn pdf_name(&self, style: FontStyle) -> &str {
        &self.entry(style).pdf_name
    }

    pub(crate) fn text_width(&self, style: FontStyle, font_size: f32, text: &str) -> f32 {
        let entry = self.entry(style);
        let w1000: f32 = match &entry.kind {
            FontKind::Base14 => to_winansi_bytes(text)
                .iter()
                .filter(|&&b| b >= 32)
                .map(|&b| base14_width_1000(entry.style, b))
                .sum(),
            FontKind::TrueType(tt) => {
                let Some(face) = tt.face.face() else {
                    return 0.0;
                };
                text.chars()
                    .filter_map(|ch| face.glyph_index(ch))
                    .filter_map(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 / tt.units * 1000.0)
                    .sum()
            }
        };
        w1000 * font_size / 1000.0
    }

    /// Encode `text` for a content stream, recording glyph usage.
    pub(crate) fn encode(&mut self, style: FontStyle, text: &str) -> Vec<u8> {
        let entry = &mut self.entries[style.index()];
        match &mut entry.kind {
            FontKind::Base14 => to_winansi_bytes(text),
            FontKind::TrueType(tt) => {
                let tt = &mut **tt;
                let Some(face) = tt.face.face() else {
                    return Vec::new();
                };
                let mut out = Vec::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    let gid = match tt.char_to_gid.get(&ch) {
                        Some(&g) => g,
                        None => {
                            let new_gid = face
                                .glyph_index(ch)
                                .map(|g| tt.remapper.remap(g.0))
                                .unwrap_or(0);
                            tt.char_to_gid.insert(ch, new_gid);
                            new_gid
                        }
                    };
                    out.push((gid >> 8) as u8);
                    out.push((gid & 0xFF) as u8);
                }
                out
            }
        }
    }

    /// Write every font object; returns `(resource name, font ref)` pairs.
    pub(crate) fn write(&self, pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> Vec<(String, Ref)> {
        self.entries
            .iter()
            .map(|entry| {
                let font_ref = alloc();
                let embedded = match &entry.kind {
                    FontKind::TrueType(tt) => embed_truetype(pdf, font_ref, tt, &mut *alloc),
                    FontKind::Base14 => false,
                };
                if !embedded {
                    pdf.type1_font(font_ref)
                        .base_font(Name(entry.style.base14_name().as_bytes()))
                        .encoding_predefined(Name(b"WinAnsiEncoding"));
                }
                (entry.pdf_name.clone(), font_ref)
            })
            .collect()
    }
}

/// Embed the glyphs used so far as a Type0 / CIDFontType2 subset with Identity-H encoding.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    tt: &TrueTypeState,
    alloc: &mut impl FnMut() -> Ref,
) -> bool {
    let Some(face) = tt.face.face() else {
        return false;
    };
    let font_name = &tt.face.family;
    let units = tt.units;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let subset_data = subsetter::subset(&tt.face.data, tt.face.face_index, &tt.remapper)
        .unwrap_or_else(|e| {
            log::warn!("Font subsetting failed for {font_name}: {e}, embedding full font");
            tt.face.data.to_vec()
        });
    let Ok(data_len) = i32::try_from(subset_data.len()) else {
        return false;
    };

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = || pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = tt
            .char_to_gid
            .iter()
            .filter_map(|(&ch, &new_gid)| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| (new_gid, adv as f32 / units * 1000.0))
            })
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        gid_widths.dedup_by_key(|&mut (gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info());
    for (&ch, &new_gid) in &tt.char_to_gid {
        if new_gid != 0 {
            cmap.pair(new_gid, ch);
        }
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    true
}

fn font_directories(extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = extra.to_vec();

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .and_then(|name| name.to_string())
}

/// (bold, italic) -> (file, face index) for faces of `family`.
type StyleIndex = HashMap<(bool, bool), (PathBuf, u32)>;

fn scan_font_dirs(dirs: &[PathBuf], family: &str) -> StyleIndex {
    let wanted = family.to_lowercase();
    let mut index = StyleIndex::new();
    let mut visited = std::collections::HashSet::new();
    let mut stack: Vec<PathBuf> = dirs.iter().rev().cloned().collect();

    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
            for face_idx in 0..face_count {
                let Ok(face) = Face::parse(&data, face_idx) else {
                    continue;
                };
                if font_family_name(&face).is_some_and(|f| f.to_lowercase() == wanted) {
                    index
                        .entry((face.is_bold(), face.is_italic()))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }
    index
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes, dropping unmappable chars.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match c as u32 {
            0x0000..=0x007F => Some(c as u8),
            0x00A0..=0x00FF => Some(c as u8),
            0x20AC => Some(0x80),
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85),
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95),
            0x2013 => Some(0x96),
            0x2014 => Some(0x97),
            0x02DC => Some(0x98),
            0x2122 => Some(0x99),
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_tables_cover_printable_ascii() {
        let book = FontBook::base14();
        // "Hi" = H(722) + i(222) at 10pt
        let w = book.text_width(FontStyle::Regular, 10.0, "Hi");
        assert!((w - 9.44).abs() < 1e-3);
        let bold = book.text_width(FontStyle::Bold, 10.0, "Hi");
        assert!(bold > w);
        assert_eq!(book.text_width(FontStyle::Mono, 10.0, "abc"), 18.0);
    }

    #[test]
    fn winansi_drops_unmappable_chars() {
        assert_eq!(to_winansi_bytes("a€→b"), vec![b'a', 0x80, b'b']);
    }

    #[test]
    fn base14_book_names_fonts_per_style() {
        let book = FontBook::base14();
        assert_eq!(book.pdf_name(FontStyle::Regular), "F1");
        assert_eq!(book.pdf_name(FontStyle::Mono), "F4");
    }
}
