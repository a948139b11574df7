//! Reading parser definitions from disk or strings.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::{DeclError, Result};
use crate::model::ParserDecl;

/// Serialization format of a definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Picks the format from the file extension (`.yaml`, `.yml`, `.json`).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(DeclError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl ParserDecl {
    /// Loads a definition file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        debug!(path = %path.display(), ?format, "loading parser definition");
        let reader = BufReader::new(File::open(path)?);
        let decl = match format {
            Format::Yaml => serde_yaml::from_reader(reader)?,
            Format::Json => serde_json::from_reader(reader)?,
        };
        Ok(decl)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("cli.yaml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("cli.YML")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("cli.json")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("cli.toml")),
            Err(DeclError::UnsupportedFormat(_))
        ));
        assert!(Format::from_path(Path::new("cli")).is_err());
    }

    #[test]
    fn test_string_sources_agree() {
        let yaml = ParserDecl::from_yaml_str("prog: tool\narguments:\n  - flags: [input]\n").unwrap();
        let json =
            ParserDecl::from_json_str(r#"{"prog": "tool", "arguments": [{"flags": ["input"]}]}"#)
                .unwrap();
        assert_eq!(yaml, json);
    }

    #[test]
    fn test_yaml_export_rebuilds_same_usage() {
        let decl = ParserDecl::from_yaml_str(
            "prog: tool\narguments:\n  - flags: [\"--mode\"]\n    choices: [fast, slow]\n",
        )
        .unwrap();
        let again = ParserDecl::from_yaml_str(&decl.to_yaml_string().unwrap()).unwrap();
        assert_eq!(again.build().unwrap().format_usage(), decl.build().unwrap().format_usage());
    }

    #[test]
    fn test_malformed_sources() {
        assert!(matches!(
            ParserDecl::from_json_str("{"),
            Err(DeclError::JsonError(_))
        ));
        assert!(matches!(
            ParserDecl::from_yaml_str("arguments: 3"),
            Err(DeclError::YamlError(_))
        ));
    }
}
