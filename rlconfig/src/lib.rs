//! # Radiolink Configuration Module
//!
//! This module provides configuration management for Radiolink, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//!
//! ## Usage
//!
//! ```no_run
//! use rlconfig::Config;
//!
//! // Load the configuration (empty string = default search order)
//! let config = Config::load_config("")?;
//!
//! // Access configuration values
//! let interval = config.get_poll_interval_ms()?;
//! let source = config.get_stream_source()?;
//!
//! // Update configuration values
//! config.set_poll_interval_ms(10_000)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Unlike a module-level singleton, the loaded `Config` is an explicitly
//! owned value; callers wrap it in an `Arc` and pass it to the components
//! that need it.

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::Mutex,
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("radiolink.yaml");

const ENV_CONFIG_DIR: &str = "RADIOLINK_CONFIG";
const ENV_PREFIX: &str = "RADIOLINK_CONFIG__";

// Default values for configuration
const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 3000;
const DEFAULT_SETTLE_DELAY_MS: u64 = 200;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_APP_SCHEME: &str = "radiolink";
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

/// Macro to generate getter/setter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<u64> {
            match self.get_value($path)? {
                Value::Number(n) if n.is_u64() => Ok(n.as_u64().unwrap()),
                Value::Number(n) if n.is_i64() => Ok(n.as_i64().unwrap().max(0) as u64),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            let n = Number::from(value);
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<String> {
            match self.get_value($path)? {
                Value::String(s) => Ok(s),
                _ => Ok($default.to_string()),
            }
        }

        pub fn $setter(&self, value: impl Into<String>) -> Result<()> {
            self.set_value($path, Value::String(value.into()))
        }
    };
}

/// The single live-stream source the player is bound to.
///
/// Set once at startup from configuration and replaced wholesale on explicit
/// reconfiguration; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    /// URL of the live audio stream
    pub stream_url: String,
    /// URL of the "current song" metadata endpoint
    pub metadata_url: String,
    /// Human-readable station name
    pub display_name: String,
}

/// Configuration manager for Radiolink
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with the embedded default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data.lock().unwrap().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(".radiolink").exists() {
            return ".radiolink".to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".radiolink");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        ".radiolink".to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("Config path is not a directory"));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        // Test read permission
        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `RADIOLINK_CONFIG` environment variable
    /// 3. `.radiolink` in the current directory
    /// 4. `.radiolink` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for
    /// read/write permissions.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        let path = Path::new(&dir_path);

        Self::validate_config_dir(path)?;

        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or
    ///   empty to use the default search order
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        // Charger la configuration par défaut
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        // Essayer de charger le fichier de configuration
        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            data
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Merger avec la config par défaut
        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        // Appliquer les overrides depuis les variables d'environnement
        Self::apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["metadata", "poll_interval_ms"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()?;
        Ok(())
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key = path[0].to_lowercase();
            let key_value = Value::String(key);
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["station", "stream_url"]`)
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if key.starts_with(ENV_PREFIX) {
                let key_path = key
                    .trim_start_matches(ENV_PREFIX)
                    .split("__")
                    .collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        let new_key = Value::String(s.to_lowercase());
                        let new_val = Self::lower_keys_value(v);
                        new_map.insert(new_key, new_val);
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    impl_u64_config!(
        get_poll_interval_ms,
        set_poll_interval_ms,
        &["metadata", "poll_interval_ms"],
        DEFAULT_POLL_INTERVAL_MS
    );

    impl_u64_config!(
        get_fetch_timeout_ms,
        set_fetch_timeout_ms,
        &["metadata", "fetch_timeout_ms"],
        DEFAULT_FETCH_TIMEOUT_MS
    );

    impl_u64_config!(
        get_settle_delay_ms,
        set_settle_delay_ms,
        &["session", "settle_delay_ms"],
        DEFAULT_SETTLE_DELAY_MS
    );

    impl_u64_config!(
        get_connect_timeout_ms,
        set_connect_timeout_ms,
        &["player", "connect_timeout_ms"],
        DEFAULT_CONNECT_TIMEOUT_MS
    );

    impl_string_config!(
        get_app_scheme,
        set_app_scheme,
        &["app", "scheme"],
        DEFAULT_APP_SCHEME
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["host", "logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );

    /// Returns the configured stream source
    ///
    /// # Errors
    ///
    /// Returns an error if the stream or metadata URL is missing from the
    /// configuration; there is no sensible default for either.
    pub fn get_stream_source(&self) -> Result<StreamSource> {
        let stream_url = match self.get_value(&["station", "stream_url"])? {
            Value::String(s) if !s.is_empty() => s,
            _ => return Err(anyhow!("station.stream_url is not configured")),
        };
        let metadata_url = match self.get_value(&["station", "metadata_url"])? {
            Value::String(s) if !s.is_empty() => s,
            _ => return Err(anyhow!("station.metadata_url is not configured")),
        };
        let display_name = match self.get_value(&["station", "display_name"]) {
            Ok(Value::String(s)) => s,
            _ => "Radiolink".to_string(),
        };

        Ok(StreamSource {
            stream_url,
            metadata_url,
            display_name,
        })
    }

    /// Replaces the configured stream source wholesale
    pub fn set_stream_source(&self, source: &StreamSource) -> Result<()> {
        self.set_value(
            &["station", "stream_url"],
            Value::String(source.stream_url.clone()),
        )?;
        self.set_value(
            &["station", "metadata_url"],
            Value::String(source.metadata_url.clone()),
        )?;
        self.set_value(
            &["station", "display_name"],
            Value::String(source.display_name.clone()),
        )
    }
}

/// Merges external YAML configuration into default configuration
///
/// Recursively merges two YAML value trees:
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        // Keep the tempdir alive for the duration of the test by leaking it;
        // the OS cleans up the temp root.
        std::mem::forget(dir);
        config
    }

    #[test]
    fn test_defaults() {
        let config = test_config();
        assert_eq!(config.get_poll_interval_ms().unwrap(), 5000);
        assert_eq!(config.get_settle_delay_ms().unwrap(), 200);
        assert_eq!(config.get_fetch_timeout_ms().unwrap(), 3000);
        assert_eq!(config.get_app_scheme().unwrap(), "radiolink");
    }

    #[test]
    fn test_set_and_get_roundtrip() {
        let config = test_config();
        config.set_poll_interval_ms(10_000).unwrap();
        assert_eq!(config.get_poll_interval_ms().unwrap(), 10_000);
    }

    #[test]
    fn test_stream_source() {
        let config = test_config();
        let source = config.get_stream_source().unwrap();
        assert!(!source.stream_url.is_empty());
        assert!(!source.metadata_url.is_empty());

        let replacement = StreamSource {
            stream_url: "https://example.org/other.aac".to_string(),
            metadata_url: "https://example.org/np".to_string(),
            display_name: "Other".to_string(),
        };
        config.set_stream_source(&replacement).unwrap();
        assert_eq!(config.get_stream_source().unwrap(), replacement);
    }

    #[test]
    fn test_missing_path_is_error() {
        let config = test_config();
        assert!(config.get_value(&["no", "such", "path"]).is_err());
    }

    #[test]
    fn test_merge_yaml_replaces_scalars() {
        let mut default: Value = serde_yaml::from_str("a: 1\nb:\n  c: 2").unwrap();
        let external: Value = serde_yaml::from_str("b:\n  c: 3").unwrap();
        merge_yaml(&mut default, &external);
        assert_eq!(
            Config::get_value_internal(&default, &["b", "c"]).unwrap(),
            Value::Number(Number::from(3))
        );
        assert_eq!(
            Config::get_value_internal(&default, &["a"]).unwrap(),
            Value::Number(Number::from(1))
        );
    }
}
