// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, SprayerConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "sprayer.toml";

/// Find the sprayer configuration file
///
/// Search order:
/// 1. `SPRAYER_CONFIG_PATH` environment variable
/// 2. Current working directory: `./sprayer.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SPRAYER_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by SPRAYER_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet SPRAYER_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML.
/// Validation is a separate step (`validate_config`).
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SprayerConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SprayerConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SPRAYER_BACKEND` -> `system.backend`
/// - `SPRAYER_LOG_LEVEL` -> `system.log_level`
/// - `SPRAYER_LOG_DIR` -> `logging.dir`
/// - `SPRAYER_QUEUE_CAPACITY` -> `queue.capacity`
///
/// Unparseable values are ignored.
pub fn apply_environment_overrides(config: &mut SprayerConfig) {
    if let Ok(value) = env::var("SPRAYER_BACKEND") {
        if let Ok(backend) = value.parse() {
            config.system.backend = backend;
        }
    }
    if let Ok(value) = env::var("SPRAYER_LOG_LEVEL") {
        config.system.log_level = value;
    }
    if let Ok(value) = env::var("SPRAYER_LOG_DIR") {
        config.logging.dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("SPRAYER_QUEUE_CAPACITY") {
        if let Ok(capacity) = value.parse::<usize>() {
            config.queue.capacity = capacity;
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"backend": "hardware", "queue_capacity": "8"}`)
pub fn apply_cli_overrides(config: &mut SprayerConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("backend") {
        if let Ok(backend) = value.parse() {
            config.system.backend = backend;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("queue_capacity") {
        if let Ok(capacity) = value.parse::<usize>() {
            config.queue.capacity = capacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActuatorBackend;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_sprayer.toml");
        File::create(&config_path).unwrap();

        env::set_var("SPRAYER_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("SPRAYER_CONFIG_PATH");

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("does_not_exist.toml");

        env::set_var("SPRAYER_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("SPRAYER_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_channel_map() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("SPRAYER_QUEUE_CAPACITY");
        env::remove_var("SPRAYER_BACKEND");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[system]").unwrap();
        writeln!(file, "backend = \"hardware\"").unwrap();
        writeln!(file, "[queue]").unwrap();
        writeln!(file, "capacity = 8").unwrap();
        writeln!(file, "[[channels]]").unwrap();
        writeln!(file, "id = 0").unwrap();
        writeln!(file, "pin = 17").unwrap();
        writeln!(file, "[[channels]]").unwrap();
        writeln!(file, "id = 1").unwrap();
        writeln!(file, "pin = 18").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.system.backend, ActuatorBackend::Hardware);
        assert_eq!(config.queue.capacity, 8);
        assert_eq!(config.channel_pins().collect::<Vec<_>>(), vec![(0, 17), (1, 18)]);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[queue\ncapacity = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SprayerConfig::default();

        env::set_var("SPRAYER_BACKEND", "hardware");
        env::set_var("SPRAYER_QUEUE_CAPACITY", "12");
        env::set_var("SPRAYER_LOG_DIR", "/var/log/sprayer");

        apply_environment_overrides(&mut config);

        env::remove_var("SPRAYER_BACKEND");
        env::remove_var("SPRAYER_QUEUE_CAPACITY");
        env::remove_var("SPRAYER_LOG_DIR");

        assert_eq!(config.system.backend, ActuatorBackend::Hardware);
        assert_eq!(config.queue.capacity, 12);
        assert_eq!(config.logging.dir, PathBuf::from("/var/log/sprayer"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = SprayerConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("backend".to_string(), "hardware".to_string());
        cli_args.insert("queue_capacity".to_string(), "not-a-number".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.system.backend, ActuatorBackend::Hardware);
        assert_eq!(config.queue.capacity, 5);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        // CLI overrides take precedence over environment variables
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[system]").unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();
        writeln!(file, "[queue]").unwrap();
        writeln!(file, "capacity = 2").unwrap();

        env::set_var("SPRAYER_LOG_LEVEL", "debug");
        env::set_var("SPRAYER_QUEUE_CAPACITY", "3");

        let mut cli_args = HashMap::new();
        cli_args.insert("log_level".to_string(), "trace".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("SPRAYER_LOG_LEVEL");
        env::remove_var("SPRAYER_QUEUE_CAPACITY");

        // CLI wins for log level, env wins for capacity (no CLI override)
        assert_eq!(config.system.log_level, "trace");
        assert_eq!(config.queue.capacity, 3);
    }
}
