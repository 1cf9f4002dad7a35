// Configuration for Armature URI templates
//
// Settings come from JSON or TOML files, `.env` files and `ARMATURE_URI_*`
// environment variables.

pub mod config;
pub mod env;
pub mod error;
pub mod loader;

pub use config::UriConfig;
pub use env::{ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
