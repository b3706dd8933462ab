//! Write the OpenAPI document as JSON to stdout or a file.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use proofboard::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, Parser)]
#[command(about = "Dump the proofboard OpenAPI document")]
struct Args {
    /// Destination file; stdout when omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("serialise OpenAPI document")?;
    match args.output {
        Some(path) => std::fs::write(&path, json)
            .wrap_err_with(|| format!("write {}", path.display()))?,
        None => writeln!(std::io::stdout().lock(), "{json}").wrap_err("write to stdout")?,
    }
    Ok(())
}
