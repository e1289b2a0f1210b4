//! CSL On-Demand - aircraft model bundles for flight-simulator multiplayer
//!
//! This library indexes CSL (Custom Scenery Library) aircraft packages and
//! serves, on demand, the minimal set of files needed to render an aircraft
//! matching a requested ICAO type, operator and livery.
//!
//! # Modules
//!
//! - [`classification`]: ICAO aircraft-type table and related-type groups
//! - [`package`]: package model and `xsb_aircraft.txt` parsing
//! - [`index`]: package discovery, merging and the aircraft registry
//! - [`matcher`]: best-match search with scored selectors
//! - [`bundle`]: per-aircraft bundle assembly and multipart rendering
//! - [`service`]: snapshot publication and the public operations
//! - [`config`], [`logging`]: configuration file and tracing setup

pub mod bundle;
pub mod classification;
pub mod config;
pub mod error;
pub mod index;
mod io;
pub mod logging;
pub mod matcher;
pub mod package;
pub mod service;

pub use error::{CslError, CslResult};
pub use service::{CslService, RebuildSummary};

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
