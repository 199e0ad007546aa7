//! Configuration loading and root folder resolution
//!
//! Resolution priority for every value:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or malformed TOML file never stops startup; it is logged and
//! the remaining tiers are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "AFFINITY_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "affinity.db";

/// Default HTTP bind address for the matching engine
pub const DEFAULT_BIND: &str = "127.0.0.1:5740";

/// Logging section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default tracing filter level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Folder holding the database
    pub root_folder: Option<PathBuf>,
    /// HTTP bind address (`host:port`)
    pub bind: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Config file to read: the explicit path, else the platform location
    /// when a file exists there
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        }
    }

    /// Load the config file if present, falling back to defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let Some(path) = Self::locate(explicit) else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Platform config file location (`~/.config/affinity/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("affinity").join("config.toml"))
}

/// Compiled fallbacks used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind: String,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("affinity"))
            .unwrap_or_else(|| PathBuf::from("./affinity_data"));

        Self {
            root_folder,
            bind: DEFAULT_BIND.to_string(),
            log_level: default_log_level(),
        }
    }
}

/// Resolves the root folder through the four configuration tiers
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml: TomlConfig,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml: TomlConfig::default(),
        }
    }

    /// Command-line override (tier 1)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Parsed TOML config (tier 3)
    pub fn with_toml(mut self, toml: TomlConfig) -> Self {
        self.toml = toml;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("[{}] Root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("[{}] Root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml.root_folder {
            info!("[{}] Root folder from config file: {}", self.module_name, path.display());
            return path.clone();
        }

        let default = CompiledDefaults::for_current_platform().root_folder;
        info!("[{}] Root folder from compiled default: {}", self.module_name, default.display());
        default
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}
