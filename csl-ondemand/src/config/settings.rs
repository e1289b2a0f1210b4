//! Runtime configuration for [`CslService`](crate::service::CslService).

use std::path::{Path, PathBuf};

use super::file::ConfigFile;

/// Default name of the directory holding CSL packages below the resources root.
pub const DEFAULT_CSL_DIR: &str = "CSL";

/// Default package manifest filename (matched case-insensitively).
pub const DEFAULT_MANIFEST_NAME: &str = "xsb_aircraft.txt";

/// Default aircraft-type classification table filename.
pub const DEFAULT_CLASSIFICATION_FILE: &str = "Doc8643.txt";

/// Default related-types grouping filename.
pub const DEFAULT_RELATED_FILE: &str = "related.txt";

/// Default maximum directory depth searched for manifests below the CSL directory.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Runtime configuration for the CSL service.
///
/// # Example
///
/// ```
/// use csl_ondemand::config::CslConfig;
///
/// let config = CslConfig::new("/srv/resources").with_max_depth(3);
///
/// assert_eq!(config.csl_root().to_str().unwrap(), "/srv/resources/CSL");
/// assert_eq!(config.max_depth, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CslConfig {
    /// Resources root holding the reference tables and the CSL directory.
    pub resources: PathBuf,

    /// Name of the CSL package directory below `resources`.
    pub csl_dir: String,

    /// Manifest filename searched for in every package.
    pub manifest_name: String,

    /// Classification table filename below `resources`.
    pub classification_file: String,

    /// Related-types filename below `resources`.
    pub related_file: String,

    /// Maximum directory depth searched below the CSL directory.
    pub max_depth: usize,
}

impl CslConfig {
    /// Create a configuration rooted at `resources` with default filenames.
    pub fn new(resources: impl Into<PathBuf>) -> Self {
        Self {
            resources: resources.into(),
            csl_dir: DEFAULT_CSL_DIR.to_string(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            classification_file: DEFAULT_CLASSIFICATION_FILE.to_string(),
            related_file: DEFAULT_RELATED_FILE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create runtime configuration from the configuration file.
    ///
    /// Returns `None` when no resources root is configured.
    pub fn from_config_file(config: &ConfigFile) -> Option<Self> {
        let resources = config.resources.root.clone()?;
        Some(Self {
            resources,
            csl_dir: config.resources.csl_dir.clone(),
            manifest_name: config.resources.manifest_name.clone(),
            classification_file: config.resources.classification_file.clone(),
            related_file: config.resources.related_file.clone(),
            max_depth: config.resources.max_depth,
        })
    }

    /// Set the CSL directory name.
    pub fn with_csl_dir(mut self, csl_dir: impl Into<String>) -> Self {
        self.csl_dir = csl_dir.into();
        self
    }

    /// Set the manifest filename.
    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Set the maximum manifest search depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Get the resources root.
    pub fn resources(&self) -> &Path {
        &self.resources
    }

    /// Directory holding the CSL packages. Package roots and bundle
    /// disposition filenames are relative to this directory.
    pub fn csl_root(&self) -> PathBuf {
        self.resources.join(&self.csl_dir)
    }

    /// Path to the classification table.
    pub fn classification_path(&self) -> PathBuf {
        self.resources.join(&self.classification_file)
    }

    /// Path to the related-types file.
    pub fn related_path(&self) -> PathBuf {
        self.resources.join(&self.related_file)
    }
}
