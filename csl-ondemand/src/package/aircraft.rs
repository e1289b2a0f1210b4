//! Aircraft definitions and the packages that declare them.

use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Write as _;

use super::model::{MatchSelector, ObjectModelRef};

/// Identity of an aircraft definition: package root plus aircraft id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AircraftKey {
    /// Package root directory relative to the CSL directory.
    pub root: String,
    /// Aircraft id from `OBJ8_AIRCRAFT`.
    pub id: String,
}

impl AircraftKey {
    pub fn new(root: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for AircraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.root, self.id)
    }
}

/// One matchable aircraft variant.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftDefinition {
    /// Root directory of the declaring package.
    pub root: String,

    /// Aircraft id, unique within the package.
    pub id: String,

    /// Object models making up the aircraft.
    pub objects: BTreeSet<ObjectModelRef>,

    /// Vertical offset applied when rendering.
    pub vert_offset: Option<f32>,

    /// Selectors this aircraft satisfies.
    pub selectors: BTreeSet<MatchSelector>,
}

impl AircraftDefinition {
    /// Create an empty definition.
    pub fn new(root: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            id: id.into(),
            objects: BTreeSet::new(),
            vert_offset: None,
            selectors: BTreeSet::new(),
        }
    }

    /// Identity key of this definition.
    pub fn key(&self) -> AircraftKey {
        AircraftKey::new(&self.root, &self.id)
    }

    /// Whether the definition has at least one object and one selector.
    ///
    /// Incomplete definitions are dropped by the manifest parser.
    pub fn is_complete(&self) -> bool {
        !self.objects.is_empty() && !self.selectors.is_empty()
    }

    /// Package names referenced by this aircraft's object models.
    pub fn dependencies(&self) -> BTreeSet<&str> {
        self.objects.iter().map(|o| o.package.as_str()).collect()
    }

    /// Whether `other` describes the same aircraft (same id and offset).
    ///
    /// Offsets compare as equal when both are absent, or both present and
    /// numerically equal (NaN equals NaN).
    pub fn same_aircraft(&self, other: &Self) -> bool {
        self.id == other.id && offsets_equal(self.vert_offset, other.vert_offset)
    }

    /// Union another definition's objects and selectors into this one.
    pub fn absorb(&mut self, other: &Self) {
        self.objects.extend(other.objects.iter().cloned());
        self.selectors.extend(other.selectors.iter().cloned());
    }

    /// Build a standalone package holding only this aircraft.
    ///
    /// The package exports every name the aircraft depends on so that a
    /// client receiving it can resolve all of its `OBJ8` references.
    pub fn pack(&self) -> Package {
        let mut package = Package::new(self.root.clone());
        package
            .export_names
            .extend(self.dependencies().into_iter().map(str::to_string));
        package.aircraft.push(self.clone());
        package
    }
}

fn offsets_equal(a: Option<f32>, b: Option<f32>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => false,
    }
}

/// A CSL package: a root directory, its exported names and its aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    /// Directory relative to the CSL root, `/`-separated.
    pub root: String,

    /// Names under which the package may be referenced.
    pub export_names: BTreeSet<String>,

    aircraft: Vec<AircraftDefinition>,
}

impl Package {
    /// Create an empty package rooted at `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            export_names: BTreeSet::new(),
            aircraft: Vec::new(),
        }
    }

    /// Add an exported name.
    pub fn with_export(mut self, name: impl Into<String>) -> Self {
        self.export_names.insert(name.into());
        self
    }

    /// Aircraft definitions in declaration order.
    pub fn aircraft(&self) -> &[AircraftDefinition] {
        &self.aircraft
    }

    /// Append an aircraft definition as declared.
    pub fn push_aircraft(&mut self, aircraft: AircraftDefinition) {
        self.aircraft.push(aircraft);
    }

    /// Merge an aircraft definition into this package.
    ///
    /// If a definition with the same id and offset exists, the two are
    /// unioned; otherwise `aircraft` is appended.
    pub fn merge_aircraft(&mut self, aircraft: &AircraftDefinition) {
        match self.aircraft.iter_mut().find(|a| a.same_aircraft(aircraft)) {
            Some(existing) => existing.absorb(aircraft),
            None => self.aircraft.push(aircraft.clone()),
        }
    }

    /// Union another package's export names and aircraft into this one.
    ///
    /// The root is left untouched.
    pub fn union_with(&mut self, other: &Package) {
        self.export_names.extend(other.export_names.iter().cloned());
        for aircraft in &other.aircraft {
            self.merge_aircraft(aircraft);
        }
    }

    /// Package names this package references but does not export itself.
    pub fn dependencies(&self) -> BTreeSet<&str> {
        self.aircraft
            .iter()
            .flat_map(|a| a.dependencies())
            .filter(|name| !self.export_names.contains(*name))
            .collect()
    }

    /// Render the package as `xsb_aircraft.txt` text.
    ///
    /// With `include_dependencies`, a `DEPENDENCY` line is emitted for each
    /// referenced package that is not exported here.
    ///
    /// # Example
    ///
    /// ```
    /// use csl_ondemand::package::{AircraftDefinition, MatchSelector, ObjectModelRef, Package};
    ///
    /// let mut aircraft = AircraftDefinition::new("C172", "C172_0HA");
    /// aircraft.objects.insert(ObjectModelRef::new("C172", "c172.obj"));
    /// aircraft.selectors.insert(MatchSelector::new("C172", None, Some("0HA")));
    ///
    /// let text = aircraft.pack().to_manifest(false);
    /// assert_eq!(
    ///     text,
    ///     "EXPORT_NAME C172\n\nOBJ8_AIRCRAFT C172_0HA\nOBJ8 SOLID YES C172/c172.obj\nMATCHES C172 - 0HA\n"
    /// );
    /// ```
    pub fn to_manifest(&self, include_dependencies: bool) -> String {
        let mut out = String::new();
        for name in &self.export_names {
            let _ = writeln!(out, "EXPORT_NAME {}", name);
        }
        if include_dependencies {
            for dependency in self.dependencies() {
                let _ = writeln!(out, "DEPENDENCY {}", dependency);
            }
        }
        for aircraft in &self.aircraft {
            out.push('\n');
            let _ = writeln!(out, "OBJ8_AIRCRAFT {}", aircraft.id);
            for object in &aircraft.objects {
                let _ = writeln!(out, "OBJ8 SOLID YES {}", object);
            }
            if let Some(offset) = aircraft.vert_offset {
                let _ = writeln!(out, "VERT_OFFSET {}", offset);
            }
            for selector in &aircraft.selectors {
                let _ = writeln!(out, "MATCHES {}", selector);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aircraft(id: &str, offset: Option<f32>, obj: &str, icao: &str) -> AircraftDefinition {
        let mut a = AircraftDefinition::new("Pkg", id);
        a.vert_offset = offset;
        a.objects.insert(ObjectModelRef::new("Pkg", obj));
        a.selectors.insert(MatchSelector::new(icao, None, None));
        a
    }

    #[test]
    fn test_offset_equality() {
        assert!(offsets_equal(None, None));
        assert!(offsets_equal(Some(1.5), Some(1.5)));
        assert!(offsets_equal(Some(f32::NAN), Some(f32::NAN)));
        assert!(!offsets_equal(Some(1.0), None));
        assert!(!offsets_equal(Some(1.0), Some(2.0)));
    }

    #[test]
    fn test_merge_same_aircraft_unions() {
        let mut package = Package::new("Pkg");
        package.merge_aircraft(&aircraft("A", Some(1.0), "a.obj", "A320"));
        package.merge_aircraft(&aircraft("A", Some(1.0), "b.obj", "A321"));

        assert_eq!(package.aircraft().len(), 1);
        assert_eq!(package.aircraft()[0].objects.len(), 2);
        assert_eq!(package.aircraft()[0].selectors.len(), 2);
    }

    #[test]
    fn test_merge_different_offset_appends() {
        let mut package = Package::new("Pkg");
        package.merge_aircraft(&aircraft("A", Some(1.0), "a.obj", "A320"));
        package.merge_aircraft(&aircraft("A", None, "a.obj", "A320"));
        package.merge_aircraft(&aircraft("B", Some(1.0), "a.obj", "A320"));

        assert_eq!(package.aircraft().len(), 3);
    }

    #[test]
    fn test_union_is_idempotent() {
        let mut other = Package::new("Other").with_export("Other");
        other.push_aircraft(aircraft("A", None, "a.obj", "A320"));

        let mut package = Package::new("Pkg").with_export("Pkg");
        package.union_with(&other);
        package.union_with(&other);

        assert_eq!(package.aircraft().len(), 1);
        assert_eq!(package.root, "Pkg");
        assert_eq!(
            package.export_names.iter().collect::<Vec<_>>(),
            vec!["Other", "Pkg"]
        );
    }

    #[test]
    fn test_dependencies_exclude_exports() {
        let mut a = aircraft("A", None, "a.obj", "A320");
        a.objects.insert(ObjectModelRef::new("Shared", "s.obj"));

        let mut package = Package::new("Pkg").with_export("Pkg");
        package.push_aircraft(a);

        assert_eq!(package.dependencies().into_iter().collect::<Vec<_>>(), vec!["Shared"]);
    }

    #[test]
    fn test_pack_exports_all_dependencies() {
        let mut a = aircraft("A", None, "a.obj", "A320");
        a.objects.insert(ObjectModelRef::new("Shared", "s.obj"));

        let packed = a.pack();
        assert_eq!(packed.root, "Pkg");
        assert!(packed.export_names.contains("Pkg"));
        assert!(packed.export_names.contains("Shared"));
        assert_eq!(packed.aircraft(), &[a]);
        assert!(packed.dependencies().is_empty());
    }

    #[test]
    fn test_manifest_rendering() {
        let mut a = AircraftDefinition::new("B738", "B738_DLH");
        a.objects.insert(
            ObjectModelRef::new("B738", "b738.obj")
                .with_textures(Some("dlh.dds".into()), Some("dlh_LIT.dds".into())),
        );
        a.vert_offset = Some(2.5);
        a.selectors.insert(MatchSelector::new("B738", Some("DLH"), None));

        let mut package = Package::new("B738").with_export("B738");
        package.push_aircraft(a);
        let shared = ObjectModelRef::new("Lights", "beacon.obj");
        let mut b = AircraftDefinition::new("B738", "B738_GEN");
        b.objects.insert(shared);
        b.selectors.insert(MatchSelector::new("B738", None, None));
        package.push_aircraft(b);

        let expected = "\
EXPORT_NAME B738
DEPENDENCY Lights

OBJ8_AIRCRAFT B738_DLH
OBJ8 SOLID YES B738/b738.obj dlh.dds dlh_LIT.dds
VERT_OFFSET 2.5
MATCHES B738 DLH

OBJ8_AIRCRAFT B738_GEN
OBJ8 SOLID YES Lights/beacon.obj
MATCHES B738
";
        assert_eq!(package.to_manifest(true), expected);
        assert!(!package.to_manifest(false).contains("DEPENDENCY"));
    }

    mod property_tests {
        use super::*;
        use proptest::collection::{btree_set, vec};
        use proptest::prelude::*;

        type Parts = (Option<i8>, BTreeSet<String>, BTreeSet<String>);

        fn parts() -> impl Strategy<Value = Parts> {
            (
                proptest::option::of(-20i8..20),
                btree_set("[a-z]{1,6}", 1..4),
                btree_set("[A-Z][0-9A-Z]{2,3}", 1..4),
            )
        }

        fn build(id: &str, (offset, objects, icaos): &Parts) -> AircraftDefinition {
            let mut a = AircraftDefinition::new("Pkg", id);
            a.vert_offset = offset.map(f32::from);
            a.objects
                .extend(objects.iter().map(|o| ObjectModelRef::new("Pkg", format!("{}.obj", o))));
            a.selectors
                .extend(icaos.iter().map(|icao| MatchSelector::new(icao, None, None)));
            a
        }

        proptest! {
            #[test]
            fn test_union_of_disjoint_ids_keeps_everything(
                left in btree_set("[a-m]{1,4}", 0..5),
                right in btree_set("[n-z]{1,4}", 0..5),
                parts in vec(parts(), 10),
            ) {
                let mut package = Package::new("Left");
                for (id, p) in left.iter().zip(&parts) {
                    package.merge_aircraft(&build(id, p));
                }
                let mut other = Package::new("Right");
                for (id, p) in right.iter().zip(parts.iter().skip(5)) {
                    other.merge_aircraft(&build(id, p));
                }

                let before = package.aircraft().to_vec();
                package.union_with(&other);

                prop_assert_eq!(package.aircraft().len(), left.len() + right.len());
                for definition in before.iter().chain(other.aircraft()) {
                    prop_assert!(package.aircraft().contains(definition));
                }
            }

            #[test]
            fn test_same_id_and_offset_unions_sets(first in parts(), second in parts()) {
                let second = (first.0, second.1, second.2);
                let a = build("A", &first);
                let b = build("A", &second);

                let mut package = Package::new("Pkg");
                package.merge_aircraft(&a);
                package.merge_aircraft(&b);

                prop_assert_eq!(package.aircraft().len(), 1);
                let merged = &package.aircraft()[0];
                let objects: BTreeSet<_> = a.objects.union(&b.objects).cloned().collect();
                let selectors: BTreeSet<_> = a.selectors.union(&b.selectors).cloned().collect();
                prop_assert_eq!(&merged.objects, &objects);
                prop_assert_eq!(&merged.selectors, &selectors);
            }

            #[test]
            fn test_different_offsets_stay_distinct(
                first in parts(),
                second in parts(),
                delta in 1i8..20,
            ) {
                let offset = first.0.map_or(delta, |v| v + delta);
                let second = (Some(offset), second.1, second.2);
                let a = build("A", &first);
                let b = build("A", &second);

                let mut package = Package::new("Pkg");
                package.merge_aircraft(&a);
                package.merge_aircraft(&b);

                let expected = vec![a, b];
                prop_assert_eq!(package.aircraft(), expected.as_slice());
            }
        }
    }
}
