//! Layered configuration loading with figment.
//!
//! # Sources (lowest to highest priority)
//!
//! 1. Built-in defaults
//! 2. The config file: an explicit [`ConfigLoader::file`], or the first of
//!    `maxbot.toml`, `config.toml` (feature `toml-config`) and `maxbot.yaml`,
//!    `maxbot.yml` (feature `yaml-config`) found in the search paths
//! 3. `MAXBOT_*` environment variables, `__` separating nested keys:
//!    `MAXBOT_CLIENT__TOKEN=abc` sets `client.token`
//! 4. Programmatic merges ([`ConfigLoader::merge`])
//!
//! Without explicit search paths the current directory and the user config
//! directory (`~/.config/maxbot` on Linux) are searched.
//!
//! ```rust,ignore
//! use maxbot_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("deploy/maxbot.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::MaxbotConfig;

/// Prefix of the environment variables read by the loader.
pub const ENV_PREFIX: &str = "MAXBOT_";

#[cfg(feature = "toml-config")]
const TOML_NAMES: &[&str] = &["maxbot.toml", "config.toml"];
#[cfg(feature = "yaml-config")]
const YAML_NAMES: &[&str] = &["maxbot.yaml", "maxbot.yml"];

/// Builder over the configuration sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    figment: Figment,
    search_paths: Vec<PathBuf>,
    config_file: Option<PathBuf>,
    load_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            config_file: None,
            load_env: true,
        }
    }

    /// Adds a directory to search for config files. Replaces the default
    /// search locations.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching. A missing file is an
    /// error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Skips `MAXBOT_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a programmatic configuration over every other source.
    pub fn merge(mut self, config: MaxbotConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Assembles all sources and extracts the configuration. Does not
    /// validate; see [`validate_config`](super::validate_config).
    pub fn load(self) -> ConfigResult<MaxbotConfig> {
        let figment = self.build_figment()?;
        let config: MaxbotConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            mode = %config.mode,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(MaxbotConfig::default()));

        match &self.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.clone()));
                }
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_file(figment, path)?;
            }
            None => match find_config_file(&resolve_search_paths(&self.search_paths)) {
                Some(path) => {
                    info!(path = %path.display(), "Loading configuration file");
                    figment = merge_file(figment, &path)?;
                }
                None => warn!("No configuration file found, using defaults"),
            },
        }

        if self.load_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        Ok(figment.merge(self.figment))
    }
}

/// Loads the configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<MaxbotConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from `path` and the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<MaxbotConfig> {
    ConfigLoader::new().file(path).load()
}

fn resolve_search_paths(explicit: &[PathBuf]) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("maxbot"));
    }
    paths
}

/// First existing config file, directories in order and formats in
/// feature order within each directory.
fn find_config_file(search_paths: &[PathBuf]) -> Option<PathBuf> {
    let mut names: Vec<&str> = Vec::new();
    #[cfg(feature = "toml-config")]
    names.extend_from_slice(TOML_NAMES);
    #[cfg(feature = "yaml-config")]
    names.extend_from_slice(YAML_NAMES);

    search_paths
        .iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Merges one file, dispatching on its extension. Only extensions enabled
/// through features are accepted.
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}
