// URI template configuration

use crate::env::{EnvLoader, ENV_PREFIX};
use crate::loader::{ConfigLoader, FileFormat};
use crate::{ConfigError, Result};
use armature_uri_core::cache::{TemplateCache, DEFAULT_CAPACITY};
use armature_uri_core::logging::{LogConfig, LogFormat, LogLevel};
use armature_uri_core::UriBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settings for URI building, template caching and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UriConfig {
    /// Encode `/` in path values as `%2F` when building URIs
    pub encode_slash_in_path: bool,
    /// Maximum number of compiled templates kept in the cache
    pub cache_capacity: usize,
    pub log_level: String,
    pub log_format: String,
}

impl Default for UriConfig {
    fn default() -> Self {
        Self {
            encode_slash_in_path: true,
            cache_capacity: DEFAULT_CAPACITY,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl UriConfig {
    /// Load from `ARMATURE_URI_*` environment variables, after reading a
    /// `.env` file if one is found.
    pub fn from_env() -> Result<Self> {
        EnvLoader::load_dotenv(None)?;
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load from environment variables named `{prefix}_{FIELD}`.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let vars = EnvLoader::new(Some(prefix.to_string())).load()?;
        let mut config = Self::default();
        config.apply(&vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON, TOML or `.env` file chosen by extension.
    pub fn from_file(path: &str) -> Result<Self> {
        let loader = ConfigLoader::auto(path)?;
        let config = match loader.format() {
            FileFormat::Json | FileFormat::Toml => loader.load_typed(path)?,
            FileFormat::Env => {
                let vars: HashMap<String, String> = loader
                    .load_file(path)?
                    .as_object()
                    .into_iter()
                    .flatten()
                    .filter_map(|(key, value)| {
                        let key = key.strip_prefix(ENV_PREFIX).map_or(key.as_str(), |k| {
                            k.trim_start_matches('_')
                        });
                        value.as_str().map(|v| (key.to_lowercase(), v.to_string()))
                    })
                    .collect();
                let mut config = Self::default();
                config.apply(&vars)?;
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, then let `ARMATURE_URI_*` variables override it.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        EnvLoader::load_dotenv(None)?;
        config.apply(&EnvLoader::default().load()?)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides keyed by lowercase field name. Unknown keys are
    /// ignored.
    pub fn apply(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        if let Some(value) = vars.get("encode_slash_in_path") {
            self.encode_slash_in_path = parse_bool(value).ok_or_else(|| {
                ConfigError::ParseError(format!("encode_slash_in_path: expected a boolean, got '{}'", value))
            })?;
        }
        if let Some(value) = vars.get("cache_capacity") {
            self.cache_capacity = value.trim().parse().map_err(|e| {
                ConfigError::ParseError(format!("cache_capacity: '{}': {}", value, e))
            })?;
        }
        if let Some(value) = vars.get("log_level") {
            self.log_level = value.trim().to_string();
        }
        if let Some(value) = vars.get("log_format") {
            self.log_format = value.trim().to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        self.level()?;
        self.format()?;
        Ok(())
    }

    fn level(&self) -> Result<LogLevel> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::ValidationError(format!("unknown log_level '{}'", self.log_level)))
    }

    fn format(&self) -> Result<LogFormat> {
        self.log_format
            .parse()
            .map_err(|_| ConfigError::ValidationError(format!("unknown log_format '{}'", self.log_format)))
    }

    /// The logging configuration these settings describe.
    pub fn log_config(&self) -> Result<LogConfig> {
        Ok(LogConfig::new().level(self.level()?).format(self.format()?))
    }

    /// A template cache sized by `cache_capacity`.
    pub fn template_cache(&self) -> TemplateCache {
        TemplateCache::with_capacity(self.cache_capacity)
    }

    /// Build `builder` with positional values, encoding `/` in path values
    /// according to `encode_slash_in_path`.
    pub fn build_uri(&self, builder: &UriBuilder, values: &[&str]) -> Result<String> {
        Ok(builder.build_with(values, self.encode_slash_in_path)?)
    }

    /// Build `builder` with named values, encoding `/` in path values
    /// according to `encode_slash_in_path`.
    pub fn build_uri_from_map<K, V>(&self, builder: &UriBuilder, values: &HashMap<K, V>) -> Result<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(builder.build_from_map_with(values, self.encode_slash_in_path)?)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
