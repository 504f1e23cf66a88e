mod adf;
mod config;
mod docx;
mod error;
mod fonts;
mod loader;
pub mod model;
pub mod pdf;
pub mod plan;
mod text;

pub use adf::AdfConverter;
pub use config::{Margins, PageSize, PdfOptions};
pub use docx::DocxConverter;
pub use error::Error;
pub use loader::{load_document, parse_document};
pub use pdf::links::{ComponentKey, LinkRegistry, LinkTarget};
pub use pdf::toc::{TocEntry, plan_toc};
pub use pdf::{PdfConverter, RenderedPdf};

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use model::Document;

/// One output format.
pub trait Converter {
    /// Short format name, as accepted on the command line.
    fn format(&self) -> &'static str;

    fn convert(&self, doc: &Document) -> Result<Vec<u8>, Error>;
}

impl Converter for PdfConverter {
    fn format(&self) -> &'static str {
        "pdf"
    }

    fn convert(&self, doc: &Document) -> Result<Vec<u8>, Error> {
        Ok(self.render(doc)?.bytes)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Docx,
    Confluence,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" | "word" => Ok(OutputFormat::Docx),
            "confluence" | "adf" => Ok(OutputFormat::Confluence),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

pub fn converter_for(format: OutputFormat, options: PdfOptions) -> Box<dyn Converter + Send + Sync> {
    match format {
        OutputFormat::Pdf => Box::new(PdfConverter::new(options)),
        OutputFormat::Docx => Box::new(DocxConverter::new()),
        OutputFormat::Confluence => Box::new(AdfConverter::new()),
    }
}

/// Load `input`, convert it and write the result to `output`.
///
/// The bytes go to a temporary sibling first and are renamed into place only
/// once complete, so a failed conversion never leaves a partial file behind.
pub fn convert_file(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    options: PdfOptions,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let doc = load_document(input)?;
    let t_load = t0.elapsed();

    let converter = converter_for(format, options);
    let bytes = converter.convert(&doc)?;
    let t_convert = t0.elapsed();

    let tmp = temp_sibling(output);
    if let Err(e) = std::fs::write(&tmp, &bytes).and_then(|()| std::fs::rename(&tmp, output)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::Io(e));
    }
    let t_total = t0.elapsed();

    log::info!(
        "Timing: load={:.1}ms, convert={:.1}ms, write={:.1}ms, total={:.1}ms ({} output {} bytes)",
        t_load.as_secs_f64() * 1000.0,
        (t_convert - t_load).as_secs_f64() * 1000.0,
        (t_total - t_convert).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        converter.format(),
        bytes.len(),
    );

    Ok(())
}

fn temp_sibling(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_aliases() {
        assert_eq!("PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("word".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert_eq!("adf".parse::<OutputFormat>().unwrap(), OutputFormat::Confluence);
        assert!(matches!(
            "html".parse::<OutputFormat>(),
            Err(Error::UnsupportedFormat(f)) if f == "html"
        ));
    }

    #[test]
    fn temp_file_sits_next_to_output() {
        let tmp = temp_sibling(Path::new("out/api.pdf"));
        assert_eq!(tmp.parent(), Some(Path::new("out")));
        assert!(tmp.file_name().unwrap().to_string_lossy().starts_with(".api.pdf."));
    }
}
