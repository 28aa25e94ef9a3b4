//! Option shapes accepted by the `format` and `minify` operations
//!
//! Field names serialize in camelCase so option maps written for the
//! browser toolkit (`printWidth`, `removeComments`, ...) decode unchanged.
//! Unknown keys are ignored.

use serde::{Deserialize, Serialize};

/// Largest accepted `tabWidth`
pub const MAX_TAB_WIDTH: usize = 16;

/// Largest accepted `printWidth`
pub const MAX_PRINT_WIDTH: usize = 1000;

/// Syntax the `format` operation parses the payload as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parser {
    #[default]
    Html,
    Json,
    Yaml,
}

impl std::fmt::Display for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Html => write!(f, "html"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

impl std::str::FromStr for Parser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unsupported parser: {other}")),
        }
    }
}

/// How significant whitespace inside HTML text is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceSensitivity {
    /// Whitespace matters inside inline formatting contexts only
    #[default]
    Css,
    /// Whitespace is kept everywhere, including at block edges
    Strict,
    /// Whitespace-only text is dropped
    Ignore,
}

impl std::str::FromStr for WhitespaceSensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "css" => Ok(Self::Css),
            "strict" => Ok(Self::Strict),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unsupported whitespace sensitivity: {other}")),
        }
    }
}

/// Options for the `format` operation
///
/// # Example
///
/// ```
/// use neatify_formatter::{FormatOptions, Parser};
///
/// let options = FormatOptions::default()
///     .with_parser(Parser::Json)
///     .with_tab_width(4);
/// assert_eq!(options.indent_unit(), "    ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatOptions {
    /// Input syntax
    pub parser: Parser,

    /// Line width the printer tries to stay within
    pub print_width: usize,

    /// Spaces per indentation level
    pub tab_width: usize,

    /// Indent with tabs instead of spaces
    pub use_tabs: bool,

    /// Put every attribute on its own line when an element has more than one
    pub single_attribute_per_line: bool,

    /// HTML whitespace handling
    pub html_whitespace_sensitivity: WhitespaceSensitivity,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            parser: Parser::Html,
            print_width: 80,
            tab_width: 2,
            use_tabs: false,
            single_attribute_per_line: false,
            html_whitespace_sensitivity: WhitespaceSensitivity::Css,
        }
    }
}

impl FormatOptions {
    /// Create format options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input syntax
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    /// Set the print width
    pub fn with_print_width(mut self, width: usize) -> Self {
        self.print_width = width.max(1);
        self
    }

    /// Set the number of spaces per indentation level
    pub fn with_tab_width(mut self, width: usize) -> Self {
        self.tab_width = width;
        self
    }

    /// Indent with tabs
    pub fn with_tabs(mut self, use_tabs: bool) -> Self {
        self.use_tabs = use_tabs;
        self
    }

    /// Force one attribute per line for multi-attribute elements
    pub fn with_single_attribute_per_line(mut self, enabled: bool) -> Self {
        self.single_attribute_per_line = enabled;
        self
    }

    /// Set HTML whitespace sensitivity
    pub fn with_whitespace_sensitivity(mut self, sensitivity: WhitespaceSensitivity) -> Self {
        self.html_whitespace_sensitivity = sensitivity;
        self
    }

    /// Check that widths are within the supported range
    pub fn validate(&self) -> Result<(), String> {
        if self.tab_width > MAX_TAB_WIDTH {
            return Err(format!(
                "tabWidth must be at most {MAX_TAB_WIDTH}, got {}",
                self.tab_width
            ));
        }
        if self.print_width == 0 || self.print_width > MAX_PRINT_WIDTH {
            return Err(format!(
                "printWidth must be between 1 and {MAX_PRINT_WIDTH}, got {}",
                self.print_width
            ));
        }
        Ok(())
    }

    /// One level of indentation
    pub fn indent_unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.tab_width)
        }
    }

    /// Display width of `depth` indentation levels
    pub(crate) fn indent_width(&self, depth: usize) -> usize {
        depth.saturating_mul(self.tab_width)
    }
}

/// Options for the `minify` operation
///
/// Both toggles default to `true`; only an explicit `false` disables them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinifyOptions {
    /// Strip `<!-- -->` comments, keeping `<!--[if ...]>` conditional comments
    pub remove_comments: bool,

    /// Drop whitespace between tags and collapse runs of whitespace
    pub collapse_whitespace: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            remove_comments: true,
            collapse_whitespace: true,
        }
    }
}

impl MinifyOptions {
    /// Create minify options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle comment removal
    pub fn with_remove_comments(mut self, enabled: bool) -> Self {
        self.remove_comments = enabled;
        self
    }

    /// Toggle whitespace collapsing
    pub fn with_collapse_whitespace(mut self, enabled: bool) -> Self {
        self.collapse_whitespace = enabled;
        self
    }
}
