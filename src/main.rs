use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use openapi_render::{OutputFormat, PageSize, PdfOptions, convert_file};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OpenAPI document (JSON or YAML)
    #[arg(short, long)]
    input: PathBuf,
    /// Where to write the rendered document
    #[arg(short, long)]
    output: PathBuf,
    /// pdf, docx (word) or confluence (adf)
    #[arg(short, long, default_value = "pdf")]
    format: OutputFormat,
    /// a4 or letter
    #[arg(long, default_value = "a4")]
    page_size: PageSize,
    /// Embed this system font family instead of Helvetica
    #[arg(long)]
    font: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut options = PdfOptions::from_env();
    options.page_size = args.page_size;
    options.font_family = args.font;

    match convert_file(&args.input, &args.output, args.format, options) {
        Ok(()) => {
            log::info!("Wrote {}", args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}: {e}", args.input.display());
            ExitCode::FAILURE
        }
    }
}
