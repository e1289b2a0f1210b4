//! Package merging and the flat aircraft registry.
//!
//! Packages are merged by exported name: the first package to export a name
//! owns it, and every later package exporting the same name has its export
//! names and aircraft unioned into the owner. The registry then lists every
//! aircraft of every distinct merged package under its `(root, id)` key,
//! keeping the first definition when two collide.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::error;

use crate::package::{AircraftDefinition, AircraftKey, Package};

/// Accumulates parsed packages before freezing them into a [`PackageIndex`].
#[derive(Debug, Default)]
pub struct PackageIndexBuilder {
    slots: Vec<Package>,
    by_name: HashMap<String, usize>,
    added: usize,
}

impl PackageIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a freshly parsed package.
    ///
    /// Names already owned by another package union this package into the
    /// owner; unowned names are registered to this package.
    pub fn add(&mut self, package: Package) {
        self.added += 1;
        let mut own_slot = None;
        let mut merged_into = Vec::new();

        for name in &package.export_names {
            match self.by_name.get(name) {
                Some(&slot) => {
                    if !merged_into.contains(&slot) {
                        merged_into.push(slot);
                    }
                }
                None => {
                    let slot = *own_slot.get_or_insert(self.slots.len());
                    self.by_name.insert(name.clone(), slot);
                }
            }
        }

        for slot in merged_into {
            self.slots[slot].union_with(&package);
        }
        if own_slot.is_some() {
            self.slots.push(package);
        }
    }

    /// Number of distinct packages so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Freeze into an immutable index and build the aircraft registry.
    pub fn build(self) -> PackageIndex {
        let packages: Vec<Arc<Package>> = self.slots.into_iter().map(Arc::new).collect();
        let by_name = self
            .by_name
            .into_iter()
            .map(|(name, slot)| (name, Arc::clone(&packages[slot])))
            .collect();

        let mut aircraft: Vec<Arc<AircraftDefinition>> = Vec::new();
        let mut by_key = HashMap::new();
        let mut duplicates = 0;

        for package in &packages {
            for definition in package.aircraft() {
                let key = definition.key();
                if by_key.contains_key(&key) {
                    duplicates += 1;
                    error!(
                        root = %key.root,
                        id = %key.id,
                        "Duplicate aircraft definition, keeping the first"
                    );
                    continue;
                }
                by_key.insert(key, aircraft.len());
                aircraft.push(Arc::new(definition.clone()));
            }
        }

        PackageIndex {
            packages,
            by_name,
            aircraft,
            by_key,
            manifests: self.added,
            duplicates,
        }
    }
}

/// Immutable view of all merged packages and their aircraft.
#[derive(Debug, Default)]
pub struct PackageIndex {
    packages: Vec<Arc<Package>>,
    by_name: HashMap<String, Arc<Package>>,
    aircraft: Vec<Arc<AircraftDefinition>>,
    by_key: HashMap<AircraftKey, usize>,
    manifests: usize,
    duplicates: usize,
}

impl PackageIndex {
    /// Build an index from packages in load order.
    pub fn from_packages(packages: impl IntoIterator<Item = Package>) -> Self {
        let mut builder = PackageIndexBuilder::new();
        for package in packages {
            builder.add(package);
        }
        builder.build()
    }

    /// Look up the package exporting `name`.
    pub fn package(&self, name: &str) -> Option<&Arc<Package>> {
        self.by_name.get(name)
    }

    /// Distinct merged packages in load order.
    pub fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }

    /// All registered aircraft in registration order.
    pub fn aircraft(&self) -> &[Arc<AircraftDefinition>] {
        &self.aircraft
    }

    /// Look up an aircraft by package root and id.
    pub fn get(&self, root: &str, id: &str) -> Option<&Arc<AircraftDefinition>> {
        self.by_key
            .get(&AircraftKey::new(root, id))
            .map(|&i| &self.aircraft[i])
    }

    /// Number of packages added before merging.
    pub fn manifests(&self) -> usize {
        self.manifests
    }

    /// Number of aircraft dropped because their key was already registered.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }
}
