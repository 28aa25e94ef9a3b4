// Shared pieces of the CLI commands

pub mod batch;
pub mod format;
pub mod minify;
pub mod presets;
pub mod warm;

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use neatify_formatter::{FormatOptions, MinifyOptions, Parser, WhitespaceSensitivity};

/// Formatting flags; each one overrides the preset value when given
#[derive(Debug, Clone, Default, Args)]
pub struct FormatArgs {
    /// Input syntax (html, json, yaml); inferred from the file extension if omitted
    #[arg(long)]
    pub parser: Option<Parser>,

    /// Line width to wrap at
    #[arg(long)]
    pub print_width: Option<usize>,

    /// Spaces per indentation level
    #[arg(long)]
    pub tab_width: Option<usize>,

    /// Indent with tabs
    #[arg(long)]
    pub use_tabs: bool,

    /// One attribute per line when an element has several
    #[arg(long)]
    pub single_attribute_per_line: bool,

    /// HTML whitespace sensitivity (css, strict, ignore)
    #[arg(long)]
    pub whitespace: Option<WhitespaceSensitivity>,
}

impl FormatArgs {
    /// Layer the flags over `base`; a file extension picks the parser
    /// only when `--parser` is absent
    pub fn apply(&self, base: &FormatOptions, path: Option<&Path>) -> FormatOptions {
        let mut options = base.clone();

        if let Some(parser) = self.parser.or_else(|| path.and_then(parser_for_path)) {
            options = options.with_parser(parser);
        }
        if let Some(width) = self.print_width {
            options = options.with_print_width(width);
        }
        if let Some(width) = self.tab_width {
            options = options.with_tab_width(width);
        }
        if self.use_tabs {
            options = options.with_tabs(true);
        }
        if self.single_attribute_per_line {
            options = options.with_single_attribute_per_line(true);
        }
        if let Some(sensitivity) = self.whitespace {
            options = options.with_whitespace_sensitivity(sensitivity);
        }

        options
    }
}

/// Minify flags
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct MinifyArgs {
    /// Keep `<!-- -->` comments
    #[arg(long)]
    pub keep_comments: bool,

    /// Do not collapse whitespace
    #[arg(long)]
    pub no_collapse: bool,
}

impl MinifyArgs {
    pub fn apply(&self, base: MinifyOptions) -> MinifyOptions {
        let mut options = base;
        if self.keep_comments {
            options = options.with_remove_comments(false);
        }
        if self.no_collapse {
            options = options.with_collapse_whitespace(false);
        }
        options
    }
}

/// Parser implied by a file extension
pub fn parser_for_path(path: &Path) -> Option<Parser> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "html" | "htm" | "xhtml" => Some(Parser::Html),
        "json" => Some(Parser::Json),
        "yaml" | "yml" => Some(Parser::Yaml),
        _ => None,
    }
}

/// Read FILE, or stdin when FILE is absent or `-`
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Elapsed milliseconds, never reported as zero
pub fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX).max(1)
}
