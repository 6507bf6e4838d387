//! # FritzBox TR-064 Configuration Module
//!
//! This module provides configuration management for the TR-064 client, including:
//! - Loading configuration from a YAML file
//! - Merging with the embedded default configuration
//! - Environment variable overrides
//! - Typed getters for the device connection values
//! - Thread-safe singleton access pattern
//!
//! Nothing is ever written back to disk: credentials only live in memory.
//!
//! ## Usage
//!
//! ```no_run
//! use fbconfig::get_config;
//!
//! let config = get_config();
//! let host = config.get_device_host()?;
//! let port = config.get_device_port()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("fbconfig.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load TR-064 configuration"));
}

pub const ENV_CONFIG_DIR: &str = "FBTR064_CONFIG";
pub const ENV_PREFIX: &str = "FBTR064_CONFIG__";

const CONFIG_DIR_NAME: &str = ".fbtr064";
const CONFIG_FILE_NAME: &str = "config.yaml";

// Default values for configuration
const DEFAULT_DEVICE_HOST: &str = "192.168.178.1";
/// TR-064 HTTP port of a FritzBox
pub const DEFAULT_DEVICE_PORT: u16 = 49000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 0;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

/// Macro to generate getter/setter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<u64> {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n
                    .as_u64()
                    .ok_or_else(|| anyhow!("{} must be a positive integer", $path.join("."))),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            self.set_value($path, Value::Number(value.into()))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<String> {
            match self.get_value($path) {
                Ok(Value::String(s)) => Ok(s),
                Ok(Value::Number(n)) => Ok(n.to_string()),
                Ok(Value::Bool(b)) => Ok(b.to_string()),
                _ => Ok($default.to_string()),
            }
        }

        pub fn $setter(&self, value: String) -> Result<()> {
            self.set_value($path, Value::String(value))
        }
    };
}

/// Configuration manager for the TR-064 client
///
/// # Examples
///
/// ```no_run
/// use fbconfig::Config;
///
/// let config = Config::load_config("/etc/fbtr064")?;
/// println!("FritzBox at {}:{}", config.get_device_host()?, config.get_device_port()?);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    ///
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `FBTR064_CONFIG` environment variable
    /// 3. `.fbtr064` in the current directory
    /// 4. `.fbtr064` in the user's home directory
    pub fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join(CONFIG_FILE_NAME);
        let path = config_file_path.to_string_lossy().to_string();

        let external = match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path, "Loaded config file");
                Some(data)
            }
            Err(_) => {
                info!(config_file = %path, "Config file not found, using default embedded config");
                None
            }
        };

        let data = Self::build_value(external.as_deref(), env::vars())?;

        Ok(Config {
            config_dir,
            path,
            data: Mutex::new(data),
        })
    }

    /// Builds the configuration tree from defaults, an optional YAML document
    /// and `(name, value)` environment pairs.
    fn build_value(
        external: Option<&[u8]>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Value> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        if let Some(yaml) = external {
            let external_value: Value = serde_yaml::from_slice(yaml)?;
            // Un fichier vide se lit comme Null : on garde les défauts
            if !external_value.is_null() {
                // Fold keys first: `Device:` merges into `device:`
                merge_yaml(&mut value, &Self::lower_keys_value(external_value));
            }
        }

        let mut value = Self::lower_keys_value(value);
        Self::apply_env_overrides(&mut value, vars);
        Ok(value)
    }

    /// Directory the configuration was resolved from
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Path of the config.yaml file (which may not exist)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sets a configuration value at the specified path
    ///
    /// The change only lives in memory.
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["device", "port"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))?;
        Self::set_value_internal(&mut data, path, value)
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
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
    /// # Returns
    ///
    /// Returns a `Result` containing the YAML value or an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))?;
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                if let Some(next) = map.get(&Value::String(key.to_lowercase())) {
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

    fn apply_env_overrides(config: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let current = Self::get_value_internal(config, &key_path).ok();
                let yaml_value = Self::convert_env_value(current.as_ref(), &value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    /// Only keys whose current value is a number or a boolean are parsed as
    /// YAML; everything else (passwords, nonces) is kept verbatim.
    fn convert_env_value(current: Option<&Value>, value: &str) -> Value {
        match current {
            Some(Value::Number(_) | Value::Bool(_)) => match serde_yaml::from_str::<Value>(value) {
                Ok(parsed @ (Value::Number(_) | Value::Bool(_))) => parsed,
                _ => Value::String(value.to_string()),
            },
            _ => Value::String(value.to_string()),
        }
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let new_key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(new_key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    impl_string_config!(
        get_device_host,
        set_device_host,
        &["device", "host"],
        DEFAULT_DEVICE_HOST
    );

    impl_string_config!(get_device_username, set_device_username, &["device", "username"], "");

    impl_string_config!(get_device_password, set_device_password, &["device", "password"], "");

    impl_u64_config!(
        get_timeout_secs,
        set_timeout_secs,
        &["device", "timeout_secs"],
        DEFAULT_TIMEOUT_SECS
    );

    impl_u64_config!(
        get_max_body_bytes,
        set_max_body_bytes,
        &["device", "max_body_bytes"],
        DEFAULT_MAX_BODY_BYTES
    );

    impl_u64_config!(
        get_poll_interval_secs,
        set_poll_interval_secs,
        &["poll", "interval_secs"],
        DEFAULT_POLL_INTERVAL_SECS
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["log", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );

    /// Gets the TR-064 port of the device
    pub fn get_device_port(&self) -> Result<u16> {
        match self.get_value(&["device", "port"]) {
            Ok(Value::Number(n)) => n
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| anyhow!("device.port must be a valid port number, got {n}")),
            _ => Ok(DEFAULT_DEVICE_PORT),
        }
    }

    pub fn set_device_port(&self, port: u16) -> Result<()> {
        self.set_value(&["device", "port"], Value::Number(port.into()))
    }

    /// Client nonce forced for every digest exchange, if configured
    pub fn get_device_cnonce(&self) -> Result<Option<String>> {
        match self.get_value(&["device", "cnonce"]) {
            Ok(Value::String(s)) if !s.is_empty() => Ok(Some(s)),
            Ok(Value::Number(n)) => Ok(Some(n.to_string())),
            _ => Ok(None),
        }
    }
}

/// Returns the global configuration instance
///
/// This function provides access to the singleton configuration instance,
/// which is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// - For mappings, keys from external are merged recursively into default
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
        (d, e) => *d = e.clone(),
    }
}
