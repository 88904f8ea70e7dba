// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

// Engine Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing:
// - Filesystem layout (servers root, backups root, container data path)
// - Container runtime connection and naming
// - Backup retention and sweep concurrency
// - Log level

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "gamehost.io/v1";
pub const KIND: &str = "EngineConfig";

/// Top-level engine configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfigManifest {
    /// API version (must be "gamehost.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "EngineConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: EngineConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfigSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub backups: BackupConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// One directory per server, keyed by server id
    #[serde(default = "default_servers_root")]
    pub servers_root: PathBuf,

    /// Archive files for every server
    #[serde(default = "default_backups_root")]
    pub backups_root: PathBuf,

    /// Mount point of the server directory inside the container
    #[serde(default = "default_container_data_path")]
    pub container_data_path: String,
}

impl StorageConfig {
    pub fn server_dir(&self, server_id: impl std::fmt::Display) -> PathBuf {
        self.servers_root.join(server_id.to_string())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            servers_root: default_servers_root(),
            backups_root: default_backups_root(),
            container_data_path: default_container_data_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Path to Docker socket. Auto-detected when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_socket_path: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Prefix for image tags and container names
    #[serde(default = "default_image_prefix")]
    pub image_prefix: String,

    /// Time the runtime waits after a graceful stop before killing
    #[serde(default = "default_stop_grace_period", with = "humantime_serde")]
    pub stop_grace_period: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_socket_path: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            image_prefix: default_image_prefix(),
            stop_grace_period: default_stop_grace_period(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Retention: archives kept per server by the cleanup sweep
    #[serde(default = "default_max_per_server")]
    pub max_per_server: usize,

    /// Servers backed up in parallel by one scheduled sweep
    #[serde(default = "default_sweep_concurrency")]
    pub sweep_concurrency: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            max_per_server: default_max_per_server(),
            sweep_concurrency: default_sweep_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl Default for EngineConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "gamehost".to_string(),
                version: None,
            },
            spec: EngineConfigSpec::default(),
        }
    }
}

impl EngineConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. GAMEHOST_CONFIG_PATH environment variable
    /// 2. ./gamehost-config.yaml (working directory)
    /// 3. ~/.gamehost/config.yaml (user home)
    /// 4. /etc/gamehost/config.yaml (Unix only)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GAMEHOST_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./gamehost-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".gamehost").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/gamehost/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(explicit_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GAMEHOST_DOCKER_SOCKET") {
            tracing::info!("Environment override: GAMEHOST_DOCKER_SOCKET={}", val);
            self.spec.runtime.docker_socket_path = Some(val);
        }
        if let Ok(val) = std::env::var("GAMEHOST_SERVERS_ROOT") {
            tracing::info!("Environment override: GAMEHOST_SERVERS_ROOT={}", val);
            self.spec.storage.servers_root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("GAMEHOST_BACKUPS_ROOT") {
            tracing::info!("Environment override: GAMEHOST_BACKUPS_ROOT={}", val);
            self.spec.storage.backups_root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("GAMEHOST_MAX_BACKUPS_PER_SERVER") {
            match val.parse::<usize>() {
                Ok(max) => {
                    tracing::info!("Environment override: GAMEHOST_MAX_BACKUPS_PER_SERVER={}", max);
                    self.spec.backups.max_per_server = max;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for GAMEHOST_MAX_BACKUPS_PER_SERVER: '{}'. Expected an integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.spec.storage.servers_root.as_os_str().is_empty() {
            anyhow::bail!("spec.storage.servers_root cannot be empty");
        }

        if self.spec.storage.backups_root.as_os_str().is_empty() {
            anyhow::bail!("spec.storage.backups_root cannot be empty");
        }

        if !self.spec.storage.container_data_path.starts_with('/') {
            anyhow::bail!(
                "spec.storage.container_data_path must be absolute, got '{}'",
                self.spec.storage.container_data_path
            );
        }

        if self.spec.runtime.image_prefix.is_empty() {
            anyhow::bail!("spec.runtime.image_prefix cannot be empty");
        }

        if self.spec.runtime.stop_grace_period.is_zero() {
            anyhow::bail!("spec.runtime.stop_grace_period must be greater than zero");
        }

        if self.spec.backups.max_per_server == 0 {
            anyhow::bail!("spec.backups.max_per_server must be at least 1");
        }

        if self.spec.backups.sweep_concurrency == 0 {
            anyhow::bail!("spec.backups.sweep_concurrency must be at least 1");
        }

        Ok(())
    }
}

fn default_servers_root() -> PathBuf {
    PathBuf::from("data/servers")
}

fn default_backups_root() -> PathBuf {
    PathBuf::from("data/backups")
}

fn default_container_data_path() -> String {
    "/data".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    120
}

fn default_image_prefix() -> String {
    "gameserver".to_string()
}

fn default_stop_grace_period() -> Duration {
    Duration::from_secs(10)
}

fn default_max_per_server() -> usize {
    5
}

fn default_sweep_concurrency() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}
