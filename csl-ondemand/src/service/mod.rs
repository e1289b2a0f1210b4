//! The CSL service: owns the published snapshot and exposes the operations
//! used by the hosting layer.
//!
//! # Snapshot publication
//!
//! [`CslService::rebuild_cache`] loads a complete [`CslSnapshot`] off to the
//! side and publishes it only when loading succeeds. Readers clone the current
//! `Arc` once per request, so a rebuild never blocks matching or bundle
//! assembly and a failed rebuild leaves the previous state in place.

mod snapshot;

pub use snapshot::{CslSnapshot, RebuildSummary};

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bundle::{Bundle, BundleAssembler};
use crate::config::CslConfig;
use crate::error::{CslError, CslResult};
use crate::io::normalize_relative;
use crate::matcher::MatchQuery;
use crate::package::AircraftKey;

/// Indexes CSL packages and serves matches and bundles from them.
///
/// # Example
///
/// ```no_run
/// use csl_ondemand::config::CslConfig;
/// use csl_ondemand::service::CslService;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), csl_ondemand::CslError> {
/// let service = CslService::new(CslConfig::new("/srv/resources"));
/// let cancel = CancellationToken::new();
/// service.rebuild_cache(&cancel).await?;
///
/// if let Some(key) = service.find_match(Some("A320"), Some("DLH"), None) {
///     let bundle = service.assemble_bundle(&key.root, &key.id, None, &cancel).await?;
///     println!("{} parts", bundle.parts().len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CslService {
    config: CslConfig,
    snapshot: RwLock<Arc<CslSnapshot>>,
    rebuild_lock: Mutex<()>,
}

impl CslService {
    /// Create a service with an empty cache.
    pub fn new(config: CslConfig) -> Self {
        Self {
            config,
            snapshot: RwLock::new(Arc::new(CslSnapshot::empty())),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CslConfig {
        &self.config
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<CslSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Reload classification, relations and packages from disk.
    ///
    /// Rebuilds are serialized. On failure or cancellation the previously
    /// published snapshot stays in place.
    pub async fn rebuild_cache(&self, cancel: &CancellationToken) -> CslResult<RebuildSummary> {
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CslError::Cancelled),
            guard = self.rebuild_lock.lock() => guard,
        };

        info!(resources = %self.config.resources().display(), "Rebuilding CSL cache");
        match CslSnapshot::load(&self.config, cancel).await {
            Ok((snapshot, summary)) => {
                *self.snapshot.write() = Arc::new(snapshot);
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "CSL cache rebuild failed, keeping previous state");
                Err(e)
            }
        }
    }

    /// Drop all loaded state.
    pub fn clear_cache(&self) {
        *self.snapshot.write() = Arc::new(CslSnapshot::empty());
        info!("CSL cache cleared");
    }

    /// Find the best aircraft for the given terms; empty terms count as absent.
    pub fn find_match(
        &self,
        icao: Option<&str>,
        operator: Option<&str>,
        livery: Option<&str>,
    ) -> Option<AircraftKey> {
        self.find_match_with(&MatchQuery::new(icao, operator, livery), &mut rand::rng())
    }

    /// Like [`find_match`](Self::find_match), breaking ties with `rng`.
    pub fn find_match_with<R: Rng>(&self, query: &MatchQuery, rng: &mut R) -> Option<AircraftKey> {
        let snapshot = self.snapshot();
        let found = snapshot.matcher().best_match_with(query, rng).map(|a| a.key());
        debug!(
            icao = query.icao(),
            operator = query.operator(),
            livery = query.livery(),
            found = ?found,
            "Match lookup"
        );
        found
    }

    /// Assemble the bundle for the aircraft `root/id`.
    ///
    /// With `texture_base_url`, textures are referenced below that URL rather
    /// than embedded.
    pub async fn assemble_bundle(
        &self,
        root: &str,
        id: &str,
        texture_base_url: Option<&str>,
        cancel: &CancellationToken,
    ) -> CslResult<Bundle> {
        let snapshot = self.snapshot();
        let aircraft = snapshot
            .index()
            .get(root, id)
            .ok_or_else(|| CslError::AircraftNotFound {
                root: root.to_string(),
                id: id.to_string(),
            })?;

        BundleAssembler::new(self.config.csl_root(), snapshot.index())
            .with_manifest_name(self.config.manifest_name.clone())
            .with_texture_base_url(texture_base_url)
            .assemble(aircraft, cancel)
            .await
    }

    /// Resolve a `/`-separated path below the CSL directory.
    ///
    /// Rejects empty and absolute paths and paths escaping the directory.
    pub fn resource_path(&self, relative: &str) -> CslResult<PathBuf> {
        let normalized = normalize_relative(relative)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CslError::InvalidResourcePath(relative.to_string()))?;
        Ok(normalized
            .split('/')
            .fold(self.config.csl_root(), |path, segment| path.join(segment)))
    }
}
