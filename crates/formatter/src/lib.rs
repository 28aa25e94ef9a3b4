//! # Neatify formatter
//!
//! The text transforms executed by dispatcher workers. Everything here is
//! synchronous and CPU bound; callers are expected to run it off the async
//! executor (the dispatcher uses `spawn_blocking`).
//!
//! - [`format`] pretty-prints HTML, JSON or YAML according to [`FormatOptions`]
//! - [`minify_html`] strips comments and collapses whitespace per [`MinifyOptions`]
//!
//! ## Example
//!
//! ```
//! use neatify_formatter::{format, minify_html, FormatOptions, MinifyOptions};
//!
//! let pretty = format("<ul><li>a</li><li>b</li></ul>", &FormatOptions::default()).unwrap();
//! assert_eq!(pretty, "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n");
//!
//! let small = minify_html("<!-- c --><div>  a  </div>", &MinifyOptions::default());
//! assert_eq!(small, "<div> a </div>");
//! ```

mod html;
mod minify;
mod options;
mod structured;

pub use html::{format_html, looks_like_html};
pub use minify::minify_html;
pub use options::{FormatOptions, MinifyOptions, Parser, WhitespaceSensitivity};
pub use structured::{format_json, format_yaml};

/// Errors produced by the `format` operation
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Malformed HTML
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Payload is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is not valid YAML
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Options outside the supported range
    #[error("invalid options: {0}")]
    Options(String),

    /// Printer produced bytes that are not UTF-8
    #[error("output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Pretty-print `code` with the parser selected in `options`
pub fn format(code: &str, options: &FormatOptions) -> Result<String, FormatError> {
    tracing::debug!(parser = %options.parser, bytes = code.len(), "Formatting payload");
    options.validate().map_err(FormatError::Options)?;

    match options.parser {
        Parser::Html => format_html(code, options),
        Parser::Json => format_json(code, options),
        Parser::Yaml => format_yaml(code, options),
    }
}
