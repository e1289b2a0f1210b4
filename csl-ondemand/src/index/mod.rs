//! Package discovery, merging and the aircraft registry.
//!
//! Loading runs in three steps:
//!
//! 1. [`ManifestDiscovery`] finds every manifest below the CSL directory
//! 2. each manifest is parsed into a [`Package`](crate::package::Package)
//! 3. [`PackageIndexBuilder`] merges packages by exported name and
//!    registers their aircraft
//!
//! Any I/O failure or cancellation aborts the whole load.

mod discovery;
mod registry;

pub use discovery::{package_root, ManifestDiscovery};
pub use registry::{PackageIndex, PackageIndexBuilder};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{CslError, CslResult};
use crate::io::open_buffered;
use crate::package::parse_manifest;

/// Discover, parse and merge all packages.
pub async fn load_package_index(
    discovery: &ManifestDiscovery,
    cancel: &CancellationToken,
) -> CslResult<PackageIndex> {
    let manifests = discovery.discover(cancel).await?;
    let mut builder = PackageIndexBuilder::new();

    for manifest in &manifests {
        let root = package_root(discovery.csl_root(), manifest).ok_or_else(|| {
            CslError::Discovery(format!(
                "manifest outside the CSL directory: {}",
                manifest.display()
            ))
        })?;
        let reader = open_buffered(manifest, cancel).await?;
        let package = parse_manifest(reader, manifest, root, cancel).await?;
        builder.add(package);
    }

    if cancel.is_cancelled() {
        return Err(CslError::Cancelled);
    }
    let index = builder.build();
    debug!(manifests = manifests.len(), "Package manifests merged");
    info!(
        packages = index.packages().len(),
        aircraft = index.aircraft().len(),
        duplicates = index.duplicates(),
        "Package index built"
    );
    Ok(index)
}
