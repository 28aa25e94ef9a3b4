//! HTML pretty-printer
//!
//! Parses the payload into a small node tree and prints it back with one
//! block-level node per line. Elements whose content is inline and fits the
//! print width stay on a single line; long opening tags break one
//! attribute per line.

use std::sync::LazyLock;

use regex::Regex;

use crate::{FormatError, FormatOptions, WhitespaceSensitivity};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "dfn", "em", "i",
    "img", "input", "kbd", "label", "mark", "q", "s", "samp", "select", "small", "span", "strong",
    "sub", "sup", "time", "u", "var", "wbr",
];

/// Elements whose end tag may be omitted
const OPTIONAL_END_TAGS: &[&str] = &[
    "body", "colgroup", "dd", "dt", "head", "html", "li", "option", "p", "tbody", "td", "tfoot",
    "th", "thead", "tr",
];

/// Elements implicitly closed by an opening tag of the same name
const SELF_NESTING_CLOSES: &[&str] = &["dd", "dt", "li", "option", "p", "td", "th", "tr"];

/// Deepest element nesting the printer will recurse into
pub const MAX_DEPTH: usize = 256;

static HTML_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\w|<!DOCTYPE|<html|<body|<div").expect("html hint pattern is valid")
});

/// Cheap check used to warn when a payload sent to the HTML printer is
/// probably something else
pub fn looks_like_html(code: &str) -> bool {
    HTML_HINT.is_match(code)
}

/// Pretty-print an HTML document or fragment
pub fn format_html(code: &str, options: &FormatOptions) -> Result<String, FormatError> {
    let nodes = TreeBuilder::new(code).build()?;

    let mut printer = Printer::new(options);
    printer.print_block_children(&nodes, 0);

    if printer.lines.is_empty() {
        return Ok(String::new());
    }

    let mut out = printer.lines.join("\n");
    out.push('\n');
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Doctype(String),
    Comment(String),
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    attrs: Vec<Attribute>,
    children: Vec<Node>,
    /// Verbatim content of raw text elements
    raw: Option<String>,
}

impl Element {
    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Attribute {
    name: String,
    value: Option<String>,
}

impl Attribute {
    fn render(&self) -> String {
        match &self.value {
            None => self.name.clone(),
            Some(value) if value.contains('"') && !value.contains('\'') => {
                format!("{}='{}'", self.name, value)
            }
            Some(value) => format!("{}=\"{}\"", self.name, value.replace('"', "&quot;")),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

struct TreeBuilder<'a> {
    src: &'a str,
    pos: usize,
    stack: Vec<Element>,
    root: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            stack: Vec::new(),
            root: Vec::new(),
        }
    }

    fn build(mut self) -> Result<Vec<Node>, FormatError> {
        while self.pos < self.src.len() {
            let rest = self.rest();

            if let Some(body) = rest.strip_prefix("<!--") {
                let end = body
                    .find("-->")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                let comment = body[..end].to_string();
                self.pos += 4 + end + 3;
                self.push(Node::Comment(comment));
            } else if rest.starts_with("</") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| self.error("unterminated closing tag"))?;
                let name = rest[2..end].trim().to_ascii_lowercase();
                self.pos += end + 1;
                self.close(&name)?;
            } else if rest.starts_with("<!") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| self.error("unterminated declaration"))?;
                let declaration = rest[2..end].split_whitespace().collect::<Vec<_>>().join(" ");
                self.pos += end + 1;
                self.push(Node::Doctype(declaration));
            } else if rest.len() > 1
                && rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.open_element()?;
            } else {
                // A '<' that starts no tag is plain text
                let skip = usize::from(rest.starts_with('<'));
                let end = rest[skip..]
                    .find('<')
                    .map(|i| i + skip)
                    .unwrap_or(rest.len());
                let text = rest[..end].to_string();
                self.pos += end;
                self.push_text(text);
            }
        }

        while let Some(element) = self.stack.pop() {
            if !OPTIONAL_END_TAGS.contains(&element.name.as_str()) {
                return Err(self.error(format!("unclosed element <{}>", element.name)));
            }
            self.push(Node::Element(element));
        }

        Ok(self.root)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::Syntax {
            line: self.src[..self.pos].matches('\n').count() + 1,
            message: message.into(),
        }
    }

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn push_text(&mut self, text: String) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        };
        match siblings.last_mut() {
            Some(Node::Text(previous)) => previous.push_str(&text),
            _ => siblings.push(Node::Text(text)),
        }
    }

    fn close(&mut self, name: &str) -> Result<(), FormatError> {
        let index = self
            .stack
            .iter()
            .rposition(|e| e.name == name)
            .ok_or_else(|| self.error(format!("unexpected closing tag </{name}>")))?;

        while self.stack.len() > index + 1 {
            if let Some(inner) = self.stack.pop() {
                if !OPTIONAL_END_TAGS.contains(&inner.name.as_str()) {
                    return Err(self.error(format!(
                        "unclosed element <{}> before </{name}>",
                        inner.name
                    )));
                }
                self.push(Node::Element(inner));
            }
        }

        if let Some(element) = self.stack.pop() {
            self.push(Node::Element(element));
        }
        Ok(())
    }

    fn open_element(&mut self) -> Result<(), FormatError> {
        let (mut element, self_closing) = self.open_tag()?;

        if SELF_NESTING_CLOSES.contains(&element.name.as_str())
            && self
                .stack
                .last()
                .is_some_and(|top| top.name == element.name)
        {
            if let Some(previous) = self.stack.pop() {
                self.push(Node::Element(previous));
            }
        }

        if self_closing || element.is_void() {
            self.push(Node::Element(element));
        } else if RAW_TEXT_ELEMENTS.contains(&element.name.as_str()) {
            element.raw = Some(self.raw_text(&element.name)?);
            self.push(Node::Element(element));
        } else {
            if self.stack.len() >= MAX_DEPTH {
                return Err(self.error(format!("nesting too deep (limit {MAX_DEPTH})")));
            }
            self.stack.push(element);
        }
        Ok(())
    }

    fn open_tag(&mut self) -> Result<(Element, bool), FormatError> {
        self.pos += 1;
        let name = self
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '_'))
            .to_ascii_lowercase();
        let mut element = Element {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
            raw: None,
        };

        loop {
            self.skip_whitespace();
            let rest = self.rest();

            if rest.is_empty() {
                return Err(self.error(format!("unterminated tag <{}>", element.name)));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((element, true));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((element, false));
            }

            let name = self.take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'));
            if name.is_empty() {
                // Stray '/' or '=' inside the tag
                self.pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
                continue;
            }

            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.attribute_value()?)
            } else {
                None
            };

            element.attrs.push(Attribute {
                name: name.to_string(),
                value,
            });
        }
    }

    fn attribute_value(&mut self) -> Result<String, FormatError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..]
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                let value = rest[1..1 + end].to_string();
                self.pos += end + 2;
                Ok(value)
            }
            _ => Ok(self
                .take_while(|c| !c.is_whitespace() && c != '>')
                .to_string()),
        }
    }

    fn raw_text(&mut self, name: &str) -> Result<String, FormatError> {
        let rest = self.rest();
        let end = rest
            .to_ascii_lowercase()
            .find(&format!("</{name}"))
            .ok_or_else(|| self.error(format!("unclosed element <{name}>")))?;
        let content = rest[..end].to_string();

        let close = rest[end..]
            .find('>')
            .ok_or_else(|| self.error(format!("unterminated closing tag </{name}")))?;
        self.pos += end + close + 1;
        Ok(content)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

// ============================================================================
// Printing
// ============================================================================

struct Printer<'o> {
    options: &'o FormatOptions,
    lines: Vec<String>,
}

impl<'o> Printer<'o> {
    fn new(options: &'o FormatOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
        }
    }

    fn sensitivity(&self) -> WhitespaceSensitivity {
        self.options.html_whitespace_sensitivity
    }

    fn emit(&mut self, depth: usize, text: impl AsRef<str>) {
        let indent = self.options.indent_unit().repeat(depth);
        self.lines.push(format!("{indent}{}", text.as_ref()));
    }

    fn fits(&self, depth: usize, text: &str) -> bool {
        !text.contains('\n')
            && self.options.indent_width(depth) + text.chars().count() <= self.options.print_width
    }

    /// Print a sibling list, grouping adjacent inline nodes onto one line
    fn print_block_children(&mut self, children: &[Node], depth: usize) {
        let mut run: Vec<&Node> = Vec::new();

        for child in children {
            if self.is_inline(child) {
                run.push(child);
            } else {
                self.flush_run(&mut run, depth);
                self.print_node(child, depth);
            }
        }
        self.flush_run(&mut run, depth);
    }

    fn flush_run(&mut self, run: &mut Vec<&Node>, depth: usize) {
        if run.is_empty() {
            return;
        }
        if let Some(content) = self.inline_content(run.drain(..)) {
            let content = content.trim();
            if !content.is_empty() {
                self.emit(depth, content);
            }
        }
    }

    fn print_node(&mut self, node: &Node, depth: usize) {
        match node {
            Node::Doctype(declaration) => {
                let text = match declaration.get(..7) {
                    Some(keyword) if keyword.eq_ignore_ascii_case("doctype") => {
                        format!("<!doctype{}>", &declaration[7..])
                    }
                    _ => format!("<!{declaration}>"),
                };
                self.emit(depth, text);
            }
            Node::Comment(comment) => self.emit(depth, format!("<!--{comment}-->")),
            Node::Text(text) => {
                let text = collapse_whitespace(text);
                if !text.trim().is_empty() {
                    self.emit(depth, text.trim());
                }
            }
            Node::Element(element) => self.print_element(element, depth),
        }
    }

    fn print_element(&mut self, element: &Element, depth: usize) {
        if let Some(raw) = &element.raw {
            self.print_raw_element(element, raw, depth);
            return;
        }

        let close = format!("</{}>", element.name);
        let flat_open = self
            .flat_open_tag(element)
            .filter(|open| self.fits(depth, open));

        if let Some(open) = &flat_open {
            if element.is_void() {
                self.emit(depth, open);
                return;
            }

            if element.children.iter().all(|c| self.is_inline(c)) {
                if let Some(content) = self.inline_content(&element.children) {
                    let content = match self.sensitivity() {
                        WhitespaceSensitivity::Strict => content,
                        _ => content.trim().to_string(),
                    };
                    let line = format!("{open}{content}{close}");
                    if self.fits(depth, &line) {
                        self.emit(depth, line);
                        return;
                    }
                }
            }

            self.emit(depth, open);
            self.print_block_children(&element.children, depth + 1);
            self.emit(depth, close);
            return;
        }

        // Opening tag does not fit: one attribute per line
        self.emit(depth, format!("<{}", element.name));
        for attr in &element.attrs {
            self.emit(depth + 1, attr.render());
        }

        if element.is_void() {
            self.emit(depth, "/>");
        } else if element.children.is_empty() {
            self.emit(depth, format!(">{close}"));
        } else {
            self.emit(depth, ">");
            self.print_block_children(&element.children, depth + 1);
            self.emit(depth, close);
        }
    }

    fn print_raw_element(&mut self, element: &Element, raw: &str, depth: usize) {
        let open = self
            .flat_open_tag(element)
            .unwrap_or_else(|| format!("<{}>", element.name));
        let close = format!("</{}>", element.name);

        // pre and textarea content is significant byte for byte
        if matches!(element.name.as_str(), "pre" | "textarea") {
            self.emit(depth, format!("{open}{raw}{close}"));
            return;
        }

        if raw.trim().is_empty() {
            self.emit(depth, format!("{open}{close}"));
            return;
        }

        self.emit(depth, open);
        let indent = self.options.indent_unit().repeat(depth + 1);
        for line in dedent(raw) {
            if line.is_empty() {
                self.lines.push(String::new());
            } else {
                self.lines.push(format!("{indent}{line}"));
            }
        }
        self.emit(depth, close);
    }

    /// Opening tag on one line, or `None` when attributes must break
    fn flat_open_tag(&self, element: &Element) -> Option<String> {
        if self.options.single_attribute_per_line && element.attrs.len() > 1 {
            return None;
        }

        let mut open = format!("<{}", element.name);
        for attr in &element.attrs {
            open.push(' ');
            open.push_str(&attr.render());
        }
        open.push_str(if element.is_void() { " />" } else { ">" });
        Some(open)
    }

    fn is_inline(&self, node: &Node) -> bool {
        match node {
            Node::Text(_) => true,
            Node::Element(element) => self.inline_element(element).is_some(),
            _ => false,
        }
    }

    /// Single-line rendering of an inline element and its subtree
    fn inline_element(&self, element: &Element) -> Option<String> {
        if element.raw.is_some() || !INLINE_ELEMENTS.contains(&element.name.as_str()) {
            return None;
        }

        let open = self.flat_open_tag(element)?;
        if element.is_void() {
            return Some(open);
        }

        let mut content = self.inline_content(&element.children)?;
        if self.sensitivity() == WhitespaceSensitivity::Ignore {
            content = content.trim().to_string();
        }
        Some(format!("{open}{content}</{}>", element.name))
    }

    /// Concatenate inline nodes, collapsing whitespace across node edges
    fn inline_content<'n>(&self, nodes: impl IntoIterator<Item = &'n Node>) -> Option<String> {
        let mut out = String::new();

        for node in nodes {
            match node {
                Node::Text(text) => {
                    let text = collapse_whitespace(text);
                    if self.sensitivity() == WhitespaceSensitivity::Ignore && text.trim().is_empty()
                    {
                        continue;
                    }
                    match text.strip_prefix(' ') {
                        Some(stripped) if out.ends_with(' ') => out.push_str(stripped),
                        _ => out.push_str(&text),
                    }
                }
                Node::Element(element) => out.push_str(&self.inline_element(element)?),
                _ => return None,
            }
        }

        Some(out)
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Strip blank edges and the common leading indentation of embedded code
fn dedent(raw: &str) -> Vec<&str> {
    let lines: Vec<&str> = raw.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(0);
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(lines.len());
    let body = &lines[first..last];

    let common = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|&l| {
            if l.trim().is_empty() {
                return "";
            }
            let start = l
                .char_indices()
                .nth(common)
                .map(|(i, _)| i)
                .unwrap_or(l.len());
            l[start..].trim_end()
        })
        .collect()
}
