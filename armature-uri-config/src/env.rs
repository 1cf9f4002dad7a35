// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Prefix of the environment variables read by [`crate::UriConfig::from_env`].
pub const ENV_PREFIX: &str = "ARMATURE_URI";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load every variable under the prefix, keyed by the lowercased name
    /// with the prefix removed (`ARMATURE_URI_CACHE_CAPACITY` becomes
    /// `cache_capacity`).
    pub fn load(&self) -> Result<HashMap<String, String>> {
        let mut config = HashMap::new();

        for (key, value) in env::vars() {
            match &self.prefix {
                Some(prefix) => {
                    let Some(name) = key
                        .strip_prefix(prefix.as_str())
                        .and_then(|rest| rest.strip_prefix('_'))
                    else {
                        continue;
                    };
                    config.insert(name.to_lowercase(), value);
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        Ok(config)
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Load variables from a `.env` file into the process environment.
    ///
    /// With no path the file is searched for from the current directory
    /// upwards. A missing file is not an error; variables already set are
    /// not overridden.
    pub fn load_dotenv(path: Option<&str>) -> Result<()> {
        let result = match path {
            Some(path) => dotenvy::from_filename(path).map(|_| ()),
            None => dotenvy::dotenv().map(|_| ()),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(ConfigError::LoadError(format!("Failed to load .env file: {}", e))),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::default();
        let value = loader.load_var_or("NONEXISTENT_VAR_12345", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn test_env_loader_missing_var() {
        let loader = EnvLoader::new(Some("ARMATURE_URI_TEST".to_string()));
        let result = loader.load_var("MISSING_VAR_67890");

        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    }

    #[test]
    fn test_prefix_requires_separator() {
        unsafe {
            std::env::set_var("ARMATURE_URI_ENVTESTX_KEY", "a");
            std::env::set_var("ARMATURE_URI_ENVTEST_KEY", "b");
        }

        let loader = EnvLoader::new(Some("ARMATURE_URI_ENVTEST".to_string()));
        let vars = loader.load().unwrap();
        assert_eq!(vars.get("key").map(String::as_str), Some("b"));
        assert!(!vars.contains_key("x_key"));

        unsafe {
            std::env::remove_var("ARMATURE_URI_ENVTESTX_KEY");
            std::env::remove_var("ARMATURE_URI_ENVTEST_KEY");
        }
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        assert!(EnvLoader::load_dotenv(Some("/nonexistent/armature-uri/.env")).is_ok());
    }
}
