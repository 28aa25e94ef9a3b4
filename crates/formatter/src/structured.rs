//! JSON and YAML beautifying
//!
//! Both parse into a generic value and re-emit it. Key order is preserved;
//! YAML comments do not survive the round trip.

use serde::{Deserialize, Serialize};

use crate::{FormatError, FormatOptions};

/// Re-indent a JSON document
pub fn format_json(code: &str, options: &FormatOptions) -> Result<String, FormatError> {
    if code.trim().is_empty() {
        return Ok(String::new());
    }

    let value: serde_json::Value = serde_json::from_str(code)?;

    let indent = options.indent_unit();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::with_capacity(code.len());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;

    let mut out = String::from_utf8(buf)?;
    out.push('\n');
    Ok(out)
}

/// Re-emit a YAML stream, one document at a time
///
/// serde_yaml always indents with two spaces, so `tabWidth` and `useTabs`
/// do not apply here.
pub fn format_yaml(code: &str, _options: &FormatOptions) -> Result<String, FormatError> {
    if code.trim().is_empty() {
        return Ok(String::new());
    }

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(code) {
        let value = serde_yaml::Value::deserialize(document)?;
        documents.push(serde_yaml::to_string(&value)?);
    }

    Ok(documents.join("---\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    fn json() -> FormatOptions {
        FormatOptions::default().with_parser(Parser::Json)
    }

    #[test]
    fn test_json_preserves_key_order() {
        let out = format_json(r#"{"name": "neatify",  "extra": [1,2,3], "a": null}"#, &json())
            .unwrap();
        assert_eq!(
            out,
            "{\n  \"name\": \"neatify\",\n  \"extra\": [\n    1,\n    2,\n    3\n  ],\n  \"a\": null\n}\n"
        );
    }

    #[test]
    fn test_json_tab_width_and_tabs() {
        let out = format_json(r#"{"a":{"b":true}}"#, &json().with_tab_width(4)).unwrap();
        assert_eq!(out, "{\n    \"a\": {\n        \"b\": true\n    }\n}\n");

        let out = format_json(r#"{"a":1}"#, &json().with_tabs(true)).unwrap();
        assert_eq!(out, "{\n\t\"a\": 1\n}\n");
    }

    #[test]
    fn test_json_invalid() {
        let err = format_json(r#"{"a": }"#, &json()).unwrap_err();
        assert!(matches!(err, FormatError::Json(_)));
    }

    #[test]
    fn test_empty_input_formats_to_empty() {
        assert_eq!(format_json("  \n", &json()).unwrap(), "");
        assert_eq!(format_yaml("", &json()).unwrap(), "");
    }

    #[test]
    fn test_yaml_normalizes_layout() {
        let out = format_yaml("name:   neatify\nlist: [1,   2]\n", &FormatOptions::default())
            .unwrap();
        assert_eq!(out, "name: neatify\nlist:\n- 1\n- 2\n");
    }

    #[test]
    fn test_yaml_multiple_documents() {
        let out = format_yaml("a: 1\n---\nb:   2\n", &FormatOptions::default()).unwrap();
        assert_eq!(out, "a: 1\n---\nb: 2\n");
    }

    #[test]
    fn test_yaml_invalid() {
        let err = format_yaml("a: [1, 2", &FormatOptions::default()).unwrap_err();
        assert!(matches!(err, FormatError::Yaml(_)));
    }
}
