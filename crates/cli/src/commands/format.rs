// Format command

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use neatify_dispatcher::{Operation, WorkerPool};
use neatify_formatter::{looks_like_html, Parser};
use serde::Serialize;

use super::{elapsed_ms, read_input, FormatArgs};
use crate::output::OutputFormat;
use crate::preset::Preset;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    parser: Parser,
    elapsed_ms: u64,
    output: String,
}

pub async fn run(
    pool: &WorkerPool,
    preset: &Preset,
    output: OutputFormat,
    quiet: bool,
    file: Option<PathBuf>,
    args: FormatArgs,
) -> Result<()> {
    let code = read_input(file.as_deref())?;
    let options = args.apply(&preset.format, file.as_deref());
    let parser = options.parser;

    if parser == Parser::Html && !looks_like_html(&code) {
        tracing::warn!("Input does not look like HTML");
    }

    let start = Instant::now();
    let formatted = pool
        .run(Operation::Format(options), code)
        .await
        .with_context(|| match &file {
            Some(path) => format!("Failed to format {}", path.display()),
            None => "Failed to format stdin".to_string(),
        })?;
    let elapsed_ms = elapsed_ms(start.elapsed());

    if output.is_text() {
        print!("{}", formatted);
        if !quiet {
            eprintln!("Formatted in {}ms", elapsed_ms);
        }
        return Ok(());
    }

    output.print_value(&FormatReport {
        file: file.map(|p| p.display().to_string()),
        parser,
        elapsed_ms,
        output: formatted,
    })
}
