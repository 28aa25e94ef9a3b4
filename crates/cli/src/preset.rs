// Named option bundles
//
// Design Decision: Preset files are a YAML or JSON list; JSON is picked by
// the `.json` extension, anything else parses as YAML.

use std::path::Path;

use neatify_formatter::{FormatOptions, MinifyOptions};
use serde::{Deserialize, Serialize};

/// Id of the built-in preset
pub const DEFAULT_PRESET_ID: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("failed to read preset file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse preset file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("unknown preset '{0}'")]
    NotFound(String),
}

/// Format and minify options saved under a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,

    pub name: String,

    #[serde(default, alias = "prettier")]
    pub format: FormatOptions,

    #[serde(default)]
    pub minify: MinifyOptions,
}

impl Preset {
    /// The built-in preset
    pub fn builtin() -> Self {
        Self {
            id: DEFAULT_PRESET_ID.to_string(),
            name: "Default".to_string(),
            format: FormatOptions::default(),
            minify: MinifyOptions::default(),
        }
    }
}

/// Presets available to a command, built-in first
#[derive(Debug, Clone)]
pub struct PresetBook {
    presets: Vec<Preset>,
}

impl Default for PresetBook {
    fn default() -> Self {
        Self {
            presets: vec![Preset::builtin()],
        }
    }
}

impl PresetBook {
    /// Built-in presets plus those in `path`, if given
    pub fn load(path: Option<&Path>) -> Result<Self, PresetError> {
        let mut book = Self::default();
        if let Some(path) = path {
            let content = std::fs::read_to_string(path).map_err(|source| PresetError::Read {
                path: path.display().to_string(),
                source,
            })?;
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            for preset in parse_presets(&content, is_json).map_err(|message| {
                PresetError::Parse {
                    path: path.display().to_string(),
                    message,
                }
            })? {
                book.insert(preset);
            }
        }
        Ok(book)
    }

    /// Add a preset, replacing any with the same id
    pub fn insert(&mut self, preset: Preset) {
        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    /// Look a preset up by id
    pub fn get(&self, id: &str) -> Result<&Preset, PresetError> {
        self.presets
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PresetError::NotFound(id.to_string()))
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }
}

fn parse_presets(content: &str, is_json: bool) -> Result<Vec<Preset>, String> {
    if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatify_formatter::{Parser, WhitespaceSensitivity};

    #[test]
    fn test_builtin_preset_defaults() {
        let book = PresetBook::default();
        let preset = book.get("default").unwrap();

        assert_eq!(preset.name, "Default");
        assert_eq!(preset.format.print_width, 80);
        assert_eq!(preset.format.tab_width, 2);
        assert!(!preset.format.use_tabs);
        assert!(!preset.format.single_attribute_per_line);
        assert_eq!(
            preset.format.html_whitespace_sensitivity,
            WhitespaceSensitivity::Css
        );
        assert!(preset.minify.remove_comments);
        assert!(preset.minify.collapse_whitespace);
    }

    #[test]
    fn test_parse_yaml_presets() {
        let yaml = r#"
- id: wide
  name: Wide
  format:
    printWidth: 120
    useTabs: true
- id: keep
  name: Keep comments
  minify:
    removeComments: false
"#;
        let presets = parse_presets(yaml, false).unwrap();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].format.print_width, 120);
        assert!(presets[0].format.use_tabs);
        assert_eq!(presets[0].format.tab_width, 2);
        assert!(!presets[1].minify.remove_comments);
        assert!(presets[1].minify.collapse_whitespace);
    }

    #[test]
    fn test_parse_json_presets_with_prettier_key() {
        let json = r#"[{
            "id": "json",
            "name": "JSON",
            "prettier": { "parser": "json", "tabWidth": 4 }
        }]"#;
        let presets = parse_presets(json, true).unwrap();
        assert_eq!(presets[0].format.parser, Parser::Json);
        assert_eq!(presets[0].format.tab_width, 4);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut book = PresetBook::default();
        let mut custom = Preset::builtin();
        custom.name = "Mine".to_string();
        book.insert(custom);

        assert_eq!(book.presets().len(), 1);
        assert_eq!(book.get("default").unwrap().name, "Mine");
    }

    #[test]
    fn test_unknown_preset() {
        let err = PresetBook::default().get("nope").unwrap_err();
        assert_eq!(err.to_string(), "unknown preset 'nope'");
    }

    #[test]
    fn test_invalid_file_content() {
        assert!(parse_presets("not: [a list", false).is_err());
        assert!(parse_presets("{}", true).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = PresetBook::load(Some(Path::new("/nonexistent/presets.yaml"))).unwrap_err();
        assert!(matches!(err, PresetError::Read { .. }));
    }
}
