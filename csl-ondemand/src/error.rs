//! Error types for the CSL on-demand core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for core operations.
pub type CslResult<T> = Result<T, CslError>;

/// Errors that can occur while building the index or assembling bundles.
///
/// Recoverable format deviations (unknown manifest keys, malformed relation
/// groups, unmatched table lines) are never surfaced here; they are logged and
/// the offending unit is skipped.
#[derive(Debug, Error)]
pub enum CslError {
    /// Failed to read a manifest, reference table, model or texture file.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An object model references a package name no indexed package exports.
    #[error("unknown package: {0}")]
    UnknownPackage(String),

    /// No aircraft definition is indexed under the given identity.
    #[error("aircraft not found: {root}/{id}")]
    AircraftNotFound { root: String, id: String },

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// A requested resource path is empty, absolute or escapes the CSL root.
    #[error("invalid resource path: {0}")]
    InvalidResourcePath(String),

    /// Manifest discovery failed.
    #[error("manifest discovery failed: {0}")]
    Discovery(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CslError {
    /// Wrap an I/O error with the path that was being read.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a lookup failure the caller should report as
    /// "not found" rather than as a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AircraftNotFound { .. } | Self::InvalidResourcePath(_)
        )
    }

    /// Whether this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_includes_path() {
        let err = CslError::io(
            "/res/CSL/C172/C172.obj",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/res/CSL/C172/C172.obj"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_not_found_classification() {
        let missing = CslError::AircraftNotFound {
            root: "C172".into(),
            id: "C172_0HA".into(),
        };
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), "aircraft not found: C172/C172_0HA");

        assert!(!CslError::UnknownPackage("B738".into()).is_not_found());
        assert!(!CslError::Cancelled.is_not_found());
        assert!(CslError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_missing_model_file_is_a_fault() {
        // A manifest pointing at a missing file is broken data, not a lookup miss.
        let err = CslError::io("x.dds", io::Error::new(io::ErrorKind::NotFound, "x"));
        assert!(!err.is_not_found());
    }
}
