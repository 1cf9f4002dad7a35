//! Integration tests for armature-uri-config

use armature_uri_config::*;
use std::env;
use std::fs;
use std::path::PathBuf;

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("armature-uri-config-{}-{}", std::process::id(), name));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_from_json_file() {
    let path = temp_file(
        "config.json",
        r#"{"encode_slash_in_path": false, "cache_capacity": 64, "log_level": "debug"}"#,
    );

    let config = UriConfig::from_file(path.to_str().unwrap()).unwrap();
    assert!(!config.encode_slash_in_path);
    assert_eq!(config.cache_capacity, 64);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.log_format, "json");

    fs::remove_file(path).unwrap();
}

#[test]
fn test_from_toml_file() {
    let path = temp_file(
        "config.toml",
        r#"
            cache_capacity = 32
            log_format = "pretty"
        "#,
    );

    let config = UriConfig::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.cache_capacity, 32);
    assert_eq!(config.log_format, "pretty");
    assert!(config.encode_slash_in_path);

    fs::remove_file(path).unwrap();
}

#[test]
fn test_from_env_file() {
    let path = temp_file(
        "config.env",
        "ARMATURE_URI_CACHE_CAPACITY=12\nARMATURE_URI_ENCODE_SLASH_IN_PATH=false\n",
    );

    let config = UriConfig::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.cache_capacity, 12);
    assert!(!config.encode_slash_in_path);

    fs::remove_file(path).unwrap();
}

#[test]
fn test_invalid_file_config_is_rejected() {
    let path = temp_file("invalid.json", r#"{"cache_capacity": 0}"#);
    let result = UriConfig::from_file(path.to_str().unwrap());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    fs::remove_file(path).unwrap();

    assert!(UriConfig::from_file("/nonexistent/uri.json").is_err());
    assert!(UriConfig::from_file("uri.yaml").is_err());
}

#[test]
fn test_from_dotenv_file() {
    let dir = env::temp_dir().join(format!("armature-uri-config-dotenv-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(".env");
    fs::write(&path, "ARMATURE_URI_LOG_FORMAT=compact\n").unwrap();

    let config = UriConfig::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.log_format, "compact");

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_from_env_with_prefix() {
    unsafe {
        env::set_var("URI_CONFIG_IT_CACHE_CAPACITY", "256");
        env::set_var("URI_CONFIG_IT_LOG_LEVEL", "warn");
    }

    let config = UriConfig::from_env_with_prefix("URI_CONFIG_IT").unwrap();
    assert_eq!(config.cache_capacity, 256);
    assert_eq!(config.log_level, "warn");

    unsafe {
        env::remove_var("URI_CONFIG_IT_CACHE_CAPACITY");
        env::remove_var("URI_CONFIG_IT_LOG_LEVEL");
    }
}

#[test]
fn test_config_drives_builder_and_cache() {
    use armature_uri_core::UriBuilder;

    let config = UriConfig {
        encode_slash_in_path: false,
        cache_capacity: 4,
        ..UriConfig::default()
    };

    let cache = config.template_cache();
    let template = cache.get_or_compile("/files/{path: .+}").unwrap();
    let builder = UriBuilder::from_template(&template).unwrap();
    let uri = config.build_uri(&builder, &["a/b.txt"]).unwrap();

    assert_eq!(uri, "/files/a/b.txt");
    assert_eq!(cache.capacity(), 4);
}
