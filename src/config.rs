//! A3 — Config.
//!
//! TOML-backed configuration with serde defaults and a legacy-YAML
//! migration path.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

const CONFIG_DIR_NAME: &str = ".pansou";
const CONFIG_FILE_NAME: &str = "config.toml";
const LEGACY_CONFIG_FILE_NAME: &str = "config.yaml";
const CACHE_DIR_NAME: &str = "pansou";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable/disable both cache tiers (default: true).
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Cache entry TTL in seconds (default: 1 hour).
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Per-task fan-out deadline in seconds, shared by the channel and
    /// plugin drivers per §6 ("the single configured batch deadline applies
    /// uniformly to both driver families").
    #[serde(default = "default_plugin_timeout_seconds")]
    pub plugin_timeout_seconds: u64,

    /// Hot-tier entry cap (default: 1000).
    #[serde(default = "default_l1_max_entries")]
    pub l1_max_entries: usize,

    /// Hot-tier compression threshold in bytes (default: 1024).
    #[serde(default = "default_l1_compression_threshold")]
    pub l1_compression_threshold: usize,

    /// Persistent-tier database directory (default: user's cache directory
    /// + "pansou").
    #[serde(default = "default_cache_dir", skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl_seconds(),
            plugin_timeout_seconds: default_plugin_timeout_seconds(),
            l1_max_entries: default_l1_max_entries(),
            l1_compression_threshold: default_l1_compression_threshold(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_seconds() -> u64 {
    3600
}

fn default_plugin_timeout_seconds() -> u64 {
    30
}

fn default_l1_max_entries() -> usize {
    1000
}

fn default_l1_compression_threshold() -> usize {
    1024
}

fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(CACHE_DIR_NAME))
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_secs(self.plugin_timeout_seconds)
    }

    /// Resolve (and create, with restrictive permissions) the directory the
    /// persistent cache database lives in, then return the database file
    /// path within it.
    pub fn db_path(&self) -> Result<PathBuf> {
        let cache_dir = self
            .cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(CACHE_DIR_NAME)))
            .ok_or_else(|| SearchError::Config("could not determine cache directory".to_string()))?;

        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)
                .map_err(|err| SearchError::Config(format!("failed to create cache directory: {err}")))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&cache_dir, fs::Permissions::from_mode(0o700)).map_err(|err| {
                    SearchError::Config(format!("failed to set cache directory permissions: {err}"))
                })?;
            }
        }

        Ok(cache_dir.join("cache.db"))
    }
}

impl Config {
    fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SearchError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(CONFIG_DIR_NAME))
    }

    fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    fn legacy_config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(LEGACY_CONFIG_FILE_NAME))
    }

    /// Migrate a legacy YAML config to TOML in place, backing up the
    /// original. A no-op if no legacy file exists or a TOML config is
    /// already present.
    fn migrate_legacy_yaml() -> Result<()> {
        let legacy_file = Self::legacy_config_file_path()?;
        let new_file = Self::config_file_path()?;

        if !legacy_file.exists() || new_file.exists() {
            return Ok(());
        }

        log::info!("migrating legacy config.yaml to config.toml");

        let yaml = fs::read_to_string(&legacy_file)
            .map_err(|err| SearchError::Config(format!("failed to read legacy config: {err}")))?;
        let config: Self = serde_yaml::from_str(&yaml)
            .map_err(|err| SearchError::Config(format!("failed to parse legacy config: {err}")))?;

        let toml_str = toml::to_string_pretty(&config)
            .map_err(|err| SearchError::Config(format!("failed to serialize config: {err}")))?;
        fs::write(&new_file, toml_str)
            .map_err(|err| SearchError::Config(format!("failed to write migrated config: {err}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&new_file, fs::Permissions::from_mode(0o600))
                .map_err(|err| SearchError::Config(format!("failed to set file permissions: {err}")))?;
        }

        let backup = legacy_file.with_extension("yaml.backup");
        fs::rename(&legacy_file, &backup)
            .map_err(|err| SearchError::Config(format!("failed to back up legacy config: {err}")))?;

        Ok(())
    }

    /// Create the config directory and a default config file if neither
    /// exists yet, migrating a legacy YAML file along the way.
    pub fn initialize() -> Result<()> {
        let config_dir = Self::config_dir()?;
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|err| SearchError::Config(format!("failed to create config directory: {err}")))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&config_dir, fs::Permissions::from_mode(0o700)).map_err(|err| {
                    SearchError::Config(format!("failed to set config directory permissions: {err}"))
                })?;
            }
        }

        Self::migrate_legacy_yaml()?;

        let config_file = Self::config_file_path()?;
        if !config_file.exists() {
            Self::default().save()?;
        }

        Ok(())
    }

    /// Load configuration, initializing defaults (and migrating a legacy
    /// file) on first run.
    pub fn load() -> Result<Self> {
        Self::initialize()?;

        let config_file = Self::config_file_path()?;
        let contents = fs::read_to_string(&config_file)
            .map_err(|err| SearchError::Config(format!("failed to read config file: {err}")))?;
        toml::from_str(&contents).map_err(|err| SearchError::Config(format!("failed to parse config file: {err}")))
    }

    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|err| SearchError::Config(format!("failed to create config directory: {err}")))?;
        }

        let config_file = Self::config_file_path()?;
        let toml_str = toml::to_string_pretty(self)
            .map_err(|err| SearchError::Config(format!("failed to serialize config: {err}")))?;
        fs::write(&config_file, toml_str)
            .map_err(|err| SearchError::Config(format!("failed to write config file: {err}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&config_file, fs::Permissions::from_mode(0o600))
                .map_err(|err| SearchError::Config(format!("failed to set file permissions: {err}")))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 3600);
        assert_eq!(config.cache.plugin_timeout_seconds, 30);
    }

    #[test]
    fn ttl_and_timeout_convert_to_duration() {
        let cache = CacheConfig::default();
        assert_eq!(cache.ttl(), Duration::from_secs(3600));
        assert_eq!(cache.plugin_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn toml_round_trip_preserves_overrides() {
        let mut config = Config::default();
        config.cache.ttl_seconds = 7200;
        config.cache.enabled = false;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let decoded: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(decoded.cache.ttl_seconds, 7200);
        assert!(!decoded.cache.enabled);
    }
}
