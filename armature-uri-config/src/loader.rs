// Configuration file loaders

use crate::{ConfigError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    /// `KEY=value` lines, as in a `.env` file
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension. A file named `.env`, or
    /// `.env.<suffix>`, is read as [`FileFormat::Env`].
    pub fn auto(path: &str) -> Result<Self> {
        let path_ref = Path::new(path);
        let is_dotenv = path_ref
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name == ".env" || name.starts_with(".env."));
        if is_dotenv {
            return Ok(Self::new(FileFormat::Env));
        }

        let ext = path_ref
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::LoadError(format!("No file extension found: {}", path)))?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::LoadError(format!("Unsupported format: {}", ext)))?;

        Ok(Self::new(format))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load configuration from file
    pub fn load_file(&self, path: &str) -> Result<Value> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("Failed to read {}: {}", path, e)))?;

        self.parse(&content)
    }

    /// Load a typed configuration from a JSON or TOML file.
    pub fn load_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.load_file(path)?;
        serde_json::from_value(value)
            .map_err(|e| ConfigError::ParseError(format!("Invalid configuration in {}: {}", path, e)))
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e))),
            FileFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(content)
                    .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
                serde_json::to_value(toml_value).map_err(|e| {
                    ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e))
                })
            }
            FileFormat::Env => Ok(Self::parse_env(content)),
        }
    }

    fn parse_env(content: &str) -> Value {
        let mut map = serde_json::Map::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        }

        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new(FileFormat::Json);
        let result = loader.parse(r#"{"cache_capacity": 42}"#).unwrap();
        assert_eq!(result["cache_capacity"], 42);
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::new(FileFormat::Toml);
        let toml = r#"
            log_level = "debug"
            cache_capacity = 42
        "#;

        let result = loader.parse(toml).unwrap();
        assert_eq!(result["log_level"], "debug");
        assert_eq!(result["cache_capacity"], 42);
    }

    #[test]
    fn test_parse_env() {
        let loader = ConfigLoader::new(FileFormat::Env);
        let env = r#"
            LOG_LEVEL=debug
            # Comment
            LOG_FORMAT="pretty"
        "#;

        let result = loader.parse(env).unwrap();
        assert_eq!(result["LOG_LEVEL"], "debug");
        assert_eq!(result["LOG_FORMAT"], "pretty");
    }

    #[test]
    fn test_parse_errors() {
        assert!(ConfigLoader::new(FileFormat::Json).parse("{").is_err());
        assert!(ConfigLoader::new(FileFormat::Toml).parse("= x").is_err());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("TOML"), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_extension("env"), Some(FileFormat::Env));
        assert_eq!(FileFormat::from_extension("yaml"), None);

        assert_eq!(ConfigLoader::auto("uri.toml").unwrap().format(), FileFormat::Toml);
        assert!(ConfigLoader::auto("uri").is_err());
    }

    #[test]
    fn test_dotenv_file_detection() {
        assert_eq!(ConfigLoader::auto(".env").unwrap().format(), FileFormat::Env);
        assert_eq!(ConfigLoader::auto("config/.env").unwrap().format(), FileFormat::Env);
        assert_eq!(ConfigLoader::auto(".env.local").unwrap().format(), FileFormat::Env);
        assert!(ConfigLoader::auto("config/.envrc").is_err());
    }
}
