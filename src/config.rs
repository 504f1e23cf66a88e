use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Points per millimetre.
pub(crate) const MM: f32 = 72.0 / 25.4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// (width, height) in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0 * MM, 297.0 * MM),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

impl FromStr for PageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" | "us-letter" => Ok(PageSize::Letter),
            _ => Err(Error::UnsupportedPageSize(s.to_string())),
        }
    }
}

/// Page margins in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            left: 10.0 * MM,
            top: 10.0 * MM,
            right: 10.0 * MM,
            bottom: 20.0 * MM,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PdfOptions {
    pub page_size: PageSize,
    pub margins: Margins,
    /// System font family to embed; `None` uses the base-14 Helvetica set.
    pub font_family: Option<String>,
    /// Searched before the platform font directories.
    pub font_dirs: Vec<PathBuf>,
}

impl PdfOptions {
    /// Defaults plus font directories from `OPENAPI_RENDER_FONTS`.
    pub fn from_env() -> Self {
        let mut options = PdfOptions::default();
        if let Ok(val) = std::env::var("OPENAPI_RENDER_FONTS") {
            let sep = if cfg!(windows) { ';' } else { ':' };
            options.font_dirs.extend(
                val.split(sep)
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from),
            );
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_sizes() {
        assert_eq!("A4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert_eq!("letter".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert!("tabloid".parse::<PageSize>().is_err());
    }

    #[test]
    fn a4_is_in_points() {
        let (w, h) = PageSize::A4.dimensions();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);
    }
}
