//! # DroidDMR Configuration Module
//!
//! This module provides configuration management for DroidDMR, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Typed getters with defaults for the renderer settings
//!
//! ## Usage
//!
//! ```no_run
//! use dmrconfig::get_config;
//!
//! let config = get_config();
//! let ids = config.get_instance_ids();
//! let volume = config.get_initial_volume();
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("droiddmr.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load DroidDMR configuration"));
}

const ENV_CONFIG_DIR: &str = "DROIDDMR_CONFIG";
const ENV_PREFIX: &str = "DROIDDMR_CONFIG__";
const CONFIG_DIR_NAME: &str = ".droiddmr";

// Default values for configuration
const DEFAULT_FRIENDLY_NAME: &str = "DroidDMR";
const DEFAULT_INSTANCE_ID: u32 = 0;
const DEFAULT_INITIAL_VOLUME: u16 = 50;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_EVENT_MODERATION_MS: u64 = 200;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

/// Macro to generate getter/setter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap_or($default),
                Ok(Value::String(s)) => s.trim().parse().unwrap_or($default),
                _ => $default,
            }
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.trim().is_empty() => s,
                _ => $default.to_string(),
            }
        }

        pub fn $setter(&self, value: String) -> Result<()> {
            self.set_value($path, Value::String(value))
        }
    };
}

/// Typed view of the `renderer` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub friendly_name: String,
    pub instances: Vec<u32>,
    pub initial_volume: u16,
    pub probe_timeout_ms: u64,
    pub event_moderation_ms: u64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            friendly_name: DEFAULT_FRIENDLY_NAME.to_string(),
            instances: vec![DEFAULT_INSTANCE_ID],
            initial_volume: DEFAULT_INITIAL_VOLUME,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            event_moderation_ms: DEFAULT_EVENT_MODERATION_MS,
        }
    }
}

/// Configuration manager for DroidDMR
///
/// The YAML tree is held behind a mutex; every setter persists the whole
/// tree back to `config.yaml`.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
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
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        CONFIG_DIR_NAME.to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&config_dir))?;
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file=%path, "Loaded config file");
                let external_value: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut default_value, &lower_keys_value(external_value));
            }
            Err(_) => {
                info!(config_file=%path, "Config file not found, using default embedded config");
            }
        }

        let mut config_value = lower_keys_value(default_value);
        apply_env_overrides(&mut config_value, env::vars());

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    fn data(&self) -> Result<MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.data()?)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["renderer", "initial_volume"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data()?;
            set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    /// Gets a configuration value at the specified path
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data()?;
        get_value_internal(&data, path)
    }

    impl_string_config!(
        get_friendly_name,
        set_friendly_name,
        &["renderer", "friendly_name"],
        DEFAULT_FRIENDLY_NAME
    );

    impl_u64_config!(
        get_probe_timeout_ms,
        set_probe_timeout_ms,
        &["renderer", "probe_timeout_ms"],
        DEFAULT_PROBE_TIMEOUT_MS
    );

    impl_u64_config!(
        get_event_moderation_ms,
        set_event_moderation_ms,
        &["renderer", "event_moderation_ms"],
        DEFAULT_EVENT_MODERATION_MS
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["host", "logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );

    pub fn get_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.get_probe_timeout_ms())
    }

    pub fn get_event_moderation(&self) -> Duration {
        Duration::from_millis(self.get_event_moderation_ms())
    }

    /// Instance identifiers exposed by the renderer.
    ///
    /// Entries that are not non-negative integers are skipped; an empty or
    /// missing list falls back to a single instance `0`.
    pub fn get_instance_ids(&self) -> Vec<u32> {
        let ids: Vec<u32> = match self.get_value(&["renderer", "instances"]) {
            Ok(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(|v| {
                    let id = v.as_u64().and_then(|n| u32::try_from(n).ok());
                    if id.is_none() {
                        warn!("Ignoring invalid instance id {:?}", v);
                    }
                    id
                })
                .collect(),
            Ok(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };

        if ids.is_empty() {
            vec![DEFAULT_INSTANCE_ID]
        } else {
            ids
        }
    }

    pub fn set_instance_ids(&self, ids: &[u32]) -> Result<()> {
        let seq = ids.iter().map(|&id| Value::Number(Number::from(id))).collect();
        self.set_value(&["renderer", "instances"], Value::Sequence(seq))
    }

    /// Startup volume, 0..=100.
    pub fn get_initial_volume(&self) -> u16 {
        let volume = match self.get_value(&["renderer", "initial_volume"]) {
            Ok(Value::Number(n)) => n.as_u64().unwrap_or(DEFAULT_INITIAL_VOLUME as u64),
            Ok(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_INITIAL_VOLUME as u64),
            _ => DEFAULT_INITIAL_VOLUME as u64,
        };

        if volume > 100 {
            warn!("Initial volume {} out of range, clamping to 100", volume);
        }
        volume.min(100) as u16
    }

    pub fn set_initial_volume(&self, volume: u16) -> Result<()> {
        self.set_value(
            &["renderer", "initial_volume"],
            Value::Number(Number::from(volume.min(100))),
        )
    }

    /// Whole `renderer` section, validated through the typed getters.
    pub fn get_renderer_settings(&self) -> RendererSettings {
        let mut settings: RendererSettings = self
            .get_value(&["renderer"])
            .ok()
            .and_then(|v| serde_yaml::from_value(v).ok())
            .unwrap_or_default();

        settings.friendly_name = self.get_friendly_name();
        settings.instances = self.get_instance_ids();
        settings.initial_volume = self.get_initial_volume();
        settings
    }
}

/// Returns the global configuration instance
///
/// The configuration is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
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
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        if let Value::Mapping(map) = current {
            match map.get(Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            }
        } else {
            return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
        }
    }
    Ok(current.clone())
}

/// Applies `DROIDDMR_CONFIG__A__B=value` style overrides.
fn apply_env_overrides(config: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let key_path = stripped.split("__").collect::<Vec<_>>();
            let yaml_value = convert_env_value(&value);
            if let Err(e) = set_value_internal(config, &key_path, yaml_value) {
                warn!(env_var=%key, "Ignoring config override: {}", e);
            }
        }
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default ones.
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
