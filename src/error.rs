use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse OpenAPI document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to parse OpenAPI YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported format: {0} (supported: pdf, docx, confluence)")]
    UnsupportedFormat(String),

    #[error("unsupported page size: {0} (supported: a4, letter)")]
    UnsupportedPageSize(String),

    #[error("page {width}x{height}pt leaves no drawable area inside its margins")]
    InvalidPageGeometry { width: f32, height: f32 },

    #[error("failed to write DOCX package: {0}")]
    Docx(#[from] zip::result::ZipError),

    #[error("failed to write DOCX XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to encode ADF: {0}")]
    Adf(serde_json::Error),
}
