//! Configuration for the CSL on-demand service.
//!
//! Two layers are provided:
//!
//! - [`ConfigFile`]: the user-editable INI file (`~/.csl-ondemand/config.ini`)
//! - [`CslConfig`]: the runtime configuration consumed by
//!   [`CslService`](crate::service::CslService)
//!
//! # File Format
//!
//! ```text
//! [resources]
//! root = /srv/csl-resources
//! csl_dir = CSL
//! manifest_name = xsb_aircraft.txt
//! classification_file = Doc8643.txt
//! related_file = related.txt
//! max_depth = 5
//!
//! [server]
//! bind = 127.0.0.1:5080
//! path_prefix = /csl
//! texture_base_url = https://cdn.example.com/csl
//!
//! [logging]
//! level = info
//! directory = /var/log/csl-ondemand
//! ```
//!
//! CLI arguments override config file values when specified, and the
//! `CSL_RESOURCES` environment variable overrides `resources.root`.

mod file;
mod settings;

pub use file::{
    config_directory, config_file_path, ConfigError, ConfigFile, LoggingConfig, ResourcesSettings,
    ServerSettings, RESOURCES_ENV_VAR,
};
pub use settings::{
    CslConfig, DEFAULT_CLASSIFICATION_FILE, DEFAULT_CSL_DIR, DEFAULT_MANIFEST_NAME,
    DEFAULT_MAX_DEPTH, DEFAULT_RELATED_FILE,
};
