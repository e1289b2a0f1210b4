//! Immutable, fully-loaded service state.

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::classification::{read_classification_table, read_relation_groups, ClassificationTable};
use crate::config::CslConfig;
use crate::error::CslResult;
use crate::index::{load_package_index, ManifestDiscovery, PackageIndex};
use crate::io::open_buffered;
use crate::matcher::Matcher;

/// Classification table and package index loaded by one rebuild.
#[derive(Debug, Default)]
pub struct CslSnapshot {
    classification: ClassificationTable,
    index: PackageIndex,
}

impl CslSnapshot {
    /// A snapshot with nothing loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(classification: ClassificationTable, index: PackageIndex) -> Self {
        Self {
            classification,
            index,
        }
    }

    /// Load everything described by `config`: classification table, then
    /// relation groups, then packages.
    pub async fn load(config: &CslConfig, cancel: &CancellationToken) -> CslResult<(Self, RebuildSummary)> {
        let started = Instant::now();

        let path = config.classification_path();
        let reader = open_buffered(&path, cancel).await?;
        let mut classification = read_classification_table(reader, &path, cancel).await?;

        let path = config.related_path();
        let reader = open_buffered(&path, cancel).await?;
        let groups = read_relation_groups(reader, &path, cancel).await?;
        let annotated: usize = groups
            .iter()
            .map(|group| classification.apply_relation_group(group))
            .sum();

        let discovery = ManifestDiscovery::from_config(config);
        let index = load_package_index(&discovery, cancel).await?;

        let summary = RebuildSummary {
            classification_records: classification.len(),
            relation_groups: groups.len(),
            related_records: annotated,
            manifests: index.manifests(),
            packages: index.packages().len(),
            aircraft: index.aircraft().len(),
            duplicates: index.duplicates(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            classification_records = summary.classification_records,
            relation_groups = summary.relation_groups,
            manifests = summary.manifests,
            packages = summary.packages,
            aircraft = summary.aircraft,
            elapsed_ms = summary.elapsed_ms,
            "CSL cache rebuilt"
        );

        Ok((Self::new(classification, index), summary))
    }

    pub fn classification(&self) -> &ClassificationTable {
        &self.classification
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    /// Matcher over this snapshot.
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.classification, &self.index)
    }
}

/// Counts reported by a rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub classification_records: usize,
    pub relation_groups: usize,
    /// Classification records annotated with a related group.
    pub related_records: usize,
    pub manifests: usize,
    /// Distinct packages after merging by exported name.
    pub packages: usize,
    pub aircraft: usize,
    /// Aircraft dropped because their `(root, id)` was already registered.
    pub duplicates: usize,
    pub elapsed_ms: u64,
}

impl fmt::Display for RebuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Aircraft types:   {}", self.classification_records)?;
        writeln!(
            f,
            "Related groups:   {} ({} types)",
            self.relation_groups, self.related_records
        )?;
        writeln!(f, "Manifests:        {}", self.manifests)?;
        writeln!(f, "Packages:         {}", self.packages)?;
        writeln!(f, "Aircraft:         {}", self.aircraft)?;
        writeln!(f, "Duplicates:       {}", self.duplicates)?;
        write!(f, "Elapsed:          {} ms", self.elapsed_ms)
    }
}
