//! Manifest discovery below the CSL directory.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::CslConfig;
use crate::error::{CslError, CslResult};
use crate::io::cancellable;

/// Finds package manifests by filename, case-insensitively, up to a maximum
/// directory depth.
#[derive(Debug, Clone)]
pub struct ManifestDiscovery {
    csl_root: PathBuf,
    manifest_name: String,
    max_depth: usize,
}

impl ManifestDiscovery {
    /// Create a discovery for `manifest_name` files under `csl_root`.
    pub fn new(csl_root: impl Into<PathBuf>, manifest_name: impl Into<String>) -> Self {
        Self {
            csl_root: csl_root.into(),
            manifest_name: manifest_name.into(),
            max_depth: crate::config::DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a discovery from service configuration.
    pub fn from_config(config: &CslConfig) -> Self {
        Self::new(config.csl_root(), config.manifest_name.clone()).with_max_depth(config.max_depth)
    }

    /// Limit how many directories deep below the CSL root a manifest may be.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The CSL root being searched.
    pub fn csl_root(&self) -> &Path {
        &self.csl_root
    }

    /// Find all manifests, sorted by path.
    ///
    /// This walks the file system synchronously; use [`discover`](Self::discover)
    /// from async code.
    pub fn find_manifests(&self) -> CslResult<Vec<PathBuf>> {
        if !self.csl_root.is_dir() {
            return Err(CslError::Discovery(format!(
                "CSL directory does not exist: {}",
                self.csl_root.display()
            )));
        }
        let root = self.csl_root.to_str().ok_or_else(|| {
            CslError::Discovery(format!(
                "CSL directory is not valid UTF-8: {}",
                self.csl_root.display()
            ))
        })?;
        let pattern = format!(
            "{}/**/{}",
            Pattern::escape(root.trim_end_matches('/')),
            case_insensitive_pattern(&self.manifest_name)
        );
        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let entries = glob::glob_with(&pattern, options)
            .map_err(|e| CslError::Discovery(format!("invalid manifest pattern: {}", e)))?;

        let mut manifests = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() && self.within_depth(&path) => manifests.push(path),
                Ok(_) => {}
                Err(e) => warn!(path = %e.path().display(), error = %e.error(), "Skipping unreadable directory"),
            }
        }
        manifests.sort();

        debug!(
            root = %self.csl_root.display(),
            manifests = manifests.len(),
            "Manifest discovery complete"
        );
        Ok(manifests)
    }

    /// Find all manifests on the blocking pool.
    pub async fn discover(&self, cancel: &CancellationToken) -> CslResult<Vec<PathBuf>> {
        let discovery = self.clone();
        let task = tokio::task::spawn_blocking(move || discovery.find_manifests());
        cancellable(cancel, task)
            .await?
            .map_err(|e| CslError::Discovery(format!("discovery task failed: {}", e)))?
    }

    fn within_depth(&self, manifest: &Path) -> bool {
        manifest
            .strip_prefix(&self.csl_root)
            .ok()
            .and_then(Path::parent)
            .map(|dir| dir.components().count() <= self.max_depth)
            .unwrap_or(false)
    }
}

/// Glob pattern matching `name` regardless of ASCII case.
///
/// Literal pattern components are resolved with a direct existence check,
/// which ignores [`MatchOptions::case_sensitive`]; character classes force a
/// directory listing instead.
fn case_insensitive_pattern(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                format!("[{}{}]", c.to_ascii_lowercase(), c.to_ascii_uppercase())
            } else {
                Pattern::escape(c.encode_utf8(&mut [0; 4]))
            }
        })
        .collect()
}

/// Root of the package owning `manifest`: its directory relative to
/// `csl_root`, `/`-separated. Empty when the manifest sits in `csl_root` itself.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use csl_ondemand::index::package_root;
///
/// let root = package_root(Path::new("/res/CSL"), Path::new("/res/CSL/Airbus/A320/xsb_aircraft.txt"));
/// assert_eq!(root.as_deref(), Some("Airbus/A320"));
/// ```
pub fn package_root(csl_root: &Path, manifest: &Path) -> Option<String> {
    let dir = manifest.strip_prefix(csl_root).ok()?.parent()?;
    let parts = dir
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
