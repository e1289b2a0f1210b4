//! CSL package model and manifest parsing.
//!
//! # Overview
//!
//! A CSL package is a directory containing an `xsb_aircraft.txt` manifest
//! and the object/texture files it references. The manifest declares:
//!
//! - **Exported names**: names under which other packages may reference it
//! - **Aircraft definitions**: matchable aircraft variants, each built from
//!   one or more object models and claiming one or more ICAO/operator/livery
//!   selectors
//!
//! # Type Hierarchy
//!
//! ```text
//! Package
//! ├── root: String                     (directory relative to the CSL root)
//! ├── export_names: {String}
//! └── aircraft: [AircraftDefinition]
//!     ├── root, id                     (identity)
//!     ├── objects: {ObjectModelRef}    (package, path, texture overrides)
//!     ├── vert_offset: Option<f32>
//!     └── selectors: {MatchSelector}   (icao, operator, livery)
//! ```
//!
//! # Manifest Format
//!
//! ```text
//! EXPORT_NAME C172
//!
//! OBJ8_AIRCRAFT C172_0HA
//! OBJ8 SOLID YES C172/C172.obj C172_0HA.dds C172_LIT.dds
//! VERT_OFFSET 1.2
//! MATCHES C172 - 0HA
//! ```

mod aircraft;
mod model;
mod parser;

pub use aircraft::{AircraftDefinition, AircraftKey, Package};
pub use model::{MatchSelector, ObjectModelRef, NO_OPERATOR};
pub use parser::{parse_manifest, LineOutcome, ManifestParser};
