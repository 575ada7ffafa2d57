//! Configuration loading from files, environment and CLI flags

mod common;

use std::path::PathBuf;

use serial_test::serial;

use kimi_agent::cli::Cli;
use kimi_agent::config::{Config, StorageBackendKind};

const ENV_KEYS: &[&str] = &[
    "KIMI_API_KEY",
    "KIMI_BASE_URL",
    "KIMI_MODEL",
    "KIMI_TIMEOUT_SECONDS",
    "MEMORY_BACKEND",
    "MEMORY_DIR",
    "SERPAPI_KEY",
    "KIMI_MAX_SESSIONS",
    "KIMI_BIND",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_load_file_values() {
    clear_env();
    let (_dir, path) = common::temp_config_file(
        r#"
model:
  api_key: sk-from-file
  name: moonshot-v1-32k
storage:
  backend: memory
search:
  max_results: 3
sessions:
  max_sessions: 50
"#,
    );

    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    assert_eq!(config.model.api_key, "sk-from-file");
    assert_eq!(config.model.name, "moonshot-v1-32k");
    assert_eq!(config.storage.backend, StorageBackendKind::Memory);
    assert_eq!(config.search.max_results, 3);
    assert_eq!(config.sessions.max_sessions, Some(50));
    config.validate().unwrap();
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let (_dir, path) = common::temp_config_file("model:\n  api_key: sk-from-file\n");
    std::env::set_var("KIMI_API_KEY", "sk-from-env");
    std::env::set_var("MEMORY_DIR", "/tmp/kimi-env-memory");
    std::env::set_var("SERPAPI_KEY", "serp-env");

    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    clear_env();

    assert_eq!(config.model.api_key, "sk-from-env");
    assert_eq!(config.storage.dir, PathBuf::from("/tmp/kimi-env-memory"));
    assert_eq!(config.search.serpapi_key.as_deref(), Some("serp-env"));
}

#[test]
#[serial]
fn test_cli_memory_dir_wins_over_env() {
    clear_env();
    std::env::set_var("MEMORY_DIR", "/tmp/from-env");
    let cli = Cli {
        memory_dir: Some(PathBuf::from("/tmp/from-cli")),
        ..Cli::default()
    };

    let config = Config::load("/nonexistent/kimi/config.yaml", &cli).unwrap();
    clear_env();

    assert_eq!(config.storage.dir, PathBuf::from("/tmp/from-cli"));
}

#[test]
#[serial]
fn test_missing_api_key_fails_validation() {
    clear_env();
    let config = Config::load("/nonexistent/kimi/config.yaml", &Cli::default()).unwrap();
    assert!(config.model.api_key.is_empty());

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("KIMI_API_KEY"));
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    clear_env();
    let (_dir, path) = common::temp_config_file("model: [not, a, map");

    let err = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}
