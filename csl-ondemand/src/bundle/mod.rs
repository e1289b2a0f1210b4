//! On-demand bundles: every file a client needs to render one aircraft.
//!
//! A bundle holds, in order:
//!
//! 1. each distinct texture referenced by the aircraft's models
//! 2. each distinct model file, with `TEXTURE`/`TEXTURE_LIT` lines rewritten
//!    to the aircraft's overrides
//! 3. a manifest fragment declaring only this aircraft
//!
//! Filenames are relative to the CSL directory so a client can reproduce the
//! package layout.

mod assembler;
mod multipart;
mod part;

pub use assembler::BundleAssembler;
pub use multipart::{
    generate_boundary, http_date, multipart_content_type, render_multipart, BOUNDARY_LENGTH,
};
pub use part::{content_type_for, BundlePart, PartBody, TEXT_CONTENT_TYPE};

use bytes::Bytes;

use crate::package::AircraftKey;

/// The assembled files for one aircraft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    key: AircraftKey,
    parts: Vec<BundlePart>,
}

impl Bundle {
    /// Create a bundle; the last part must be the manifest fragment.
    pub(crate) fn new(key: AircraftKey, parts: Vec<BundlePart>) -> Self {
        debug_assert!(!parts.is_empty());
        Self { key, parts }
    }

    /// Identity of the bundled aircraft.
    pub fn key(&self) -> &AircraftKey {
        &self.key
    }

    /// All parts in emission order.
    pub fn parts(&self) -> &[BundlePart] {
        &self.parts
    }

    /// The manifest fragment (always the last part).
    pub fn manifest(&self) -> &BundlePart {
        &self.parts[self.parts.len() - 1]
    }

    /// Sum of the sizes of all parts.
    pub fn total_len(&self) -> u64 {
        self.parts.iter().map(BundlePart::len).sum()
    }

    /// Render as a `multipart/mixed` body.
    pub fn to_multipart(&self, boundary: &str) -> Bytes {
        render_multipart(&self.parts, boundary)
    }

    /// `Content-Type` header value matching [`to_multipart`](Self::to_multipart).
    pub fn content_type(&self, boundary: &str) -> String {
        multipart_content_type(boundary)
    }

    pub fn into_parts(self) -> Vec<BundlePart> {
        self.parts
    }
}
