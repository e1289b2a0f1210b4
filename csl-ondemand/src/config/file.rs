//! INI configuration file handling.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::{
    DEFAULT_CLASSIFICATION_FILE, DEFAULT_CSL_DIR, DEFAULT_MANIFEST_NAME, DEFAULT_MAX_DEPTH,
    DEFAULT_RELATED_FILE,
};

/// Environment variable overriding `resources.root`.
pub const RESOURCES_ENV_VAR: &str = "CSL_RESOURCES";

const DEFAULT_PATH_PREFIX: &str = "/csl";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors that can occur while loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("failed to load config {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// The file could not be written.
    #[error("failed to save config {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    /// A value failed validation.
    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[resources]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesSettings {
    /// Resources root; required before the service can start.
    pub root: Option<PathBuf>,
    pub csl_dir: String,
    pub manifest_name: String,
    pub classification_file: String,
    pub related_file: String,
    pub max_depth: usize,
}

impl Default for ResourcesSettings {
    fn default() -> Self {
        Self {
            root: None,
            csl_dir: DEFAULT_CSL_DIR.to_string(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            classification_file: DEFAULT_CLASSIFICATION_FILE.to_string(),
            related_file: DEFAULT_RELATED_FILE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// `[server]` section, consumed by the hosting layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Socket address the HTTP listener binds to.
    pub bind: SocketAddr,

    /// Route prefix, always starting with `/` and without a trailing slash.
    pub path_prefix: String,

    /// Absolute URL prefix under which texture files are reachable. When set,
    /// bundles reference textures instead of embedding them.
    pub texture_base_url: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5080)),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            texture_base_url: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive (`RUST_LOG` takes precedence).
    pub level: String,

    /// Directory for daily-rolling log files; stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

/// The user-editable configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub resources: ResourcesSettings,
    pub server: ServerSettings,
    pub logging: LoggingConfig,
}

/// Directory holding the configuration file (`~/.csl-ondemand`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".csl-ondemand")
}

/// Default configuration file path.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

impl ConfigFile {
    /// Load the configuration from the default location.
    ///
    /// A missing file yields defaults. `CSL_RESOURCES` overrides the
    /// configured resources root.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load the configuration from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            Self::from_ini(&ini)?
        } else {
            Self::default()
        };

        if let Some(root) = std::env::var_os(RESOURCES_ENV_VAR).filter(|v| !v.is_empty()) {
            config.resources.root = Some(PathBuf::from(root));
        }

        Ok(config)
    }

    /// Build the configuration from parsed INI content.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("resources")) {
            let resources = &mut config.resources;
            if let Some(v) = non_empty(section.get("root")) {
                resources.root = Some(expand_home(v));
            }
            if let Some(v) = non_empty(section.get("csl_dir")) {
                resources.csl_dir = v.to_string();
            }
            if let Some(v) = non_empty(section.get("manifest_name")) {
                resources.manifest_name = v.to_string();
            }
            if let Some(v) = non_empty(section.get("classification_file")) {
                resources.classification_file = v.to_string();
            }
            if let Some(v) = non_empty(section.get("related_file")) {
                resources.related_file = v.to_string();
            }
            if let Some(v) = non_empty(section.get("max_depth")) {
                resources.max_depth = v
                    .parse()
                    .map_err(|_| invalid("resources", "max_depth", v, "expected a positive integer"))?;
            }
        }

        if let Some(section) = ini.section(Some("server")) {
            let server = &mut config.server;
            if let Some(v) = non_empty(section.get("bind")) {
                server.bind = v
                    .parse()
                    .map_err(|_| invalid("server", "bind", v, "expected host:port"))?;
            }
            if let Some(v) = non_empty(section.get("path_prefix")) {
                server.path_prefix = normalize_prefix(v);
            }
            if let Some(v) = non_empty(section.get("texture_base_url")) {
                if !(v.starts_with("http://") || v.starts_with("https://")) {
                    return Err(invalid(
                        "server",
                        "texture_base_url",
                        v,
                        "expected an absolute http(s) URL",
                    ));
                }
                server.texture_base_url = Some(v.trim_end_matches('/').to_string());
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(v) = non_empty(section.get("level")) {
                config.logging.level = v.to_string();
            }
            if let Some(v) = non_empty(section.get("directory")) {
                config.logging.directory = Some(expand_home(v));
            }
        }

        Ok(config)
    }

    /// Render the configuration as INI content.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let resources = &self.resources;
        ini.with_section(Some("resources"))
            .set(
                "root",
                resources
                    .root
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            )
            .set("csl_dir", resources.csl_dir.as_str())
            .set("manifest_name", resources.manifest_name.as_str())
            .set("classification_file", resources.classification_file.as_str())
            .set("related_file", resources.related_file.as_str())
            .set("max_depth", resources.max_depth.to_string());
        ini.with_section(Some("server"))
            .set("bind", self.server.bind.to_string())
            .set("path_prefix", self.server.path_prefix.as_str())
            .set(
                "texture_base_url",
                self.server.texture_base_url.clone().unwrap_or_default(),
            );
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            );
        ini
    }

    /// Save the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_err = |reason: String| ConfigError::Save {
            path: path.to_path_buf(),
            reason,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|e| save_err(e.to_string()))
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}
