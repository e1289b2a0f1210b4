//! Individual files of a bundle.

use std::time::SystemTime;

use bytes::Bytes;

/// Content type of rewritten model files and the manifest fragment.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=us-ascii";

/// Content type of a texture or other binary file, by extension.
///
/// # Example
///
/// ```
/// use csl_ondemand::bundle::content_type_for;
///
/// assert_eq!(content_type_for("C172/C172_0HA.DDS"), "image/vnd.ms-dds");
/// assert_eq!(content_type_for("C172/lights.png"), "image/png");
/// assert_eq!(content_type_for("C172/readme"), "application/octet-stream");
/// ```
pub fn content_type_for(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("dds") => "image/vnd.ms-dds",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Payload of a bundle part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Embedded file contents.
    Inline(Bytes),
    /// File served separately at `url`; `length` is the size of that file.
    External { url: String, length: u64 },
}

/// One named file of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePart {
    /// Path relative to the CSL directory, `/`-separated.
    pub filename: String,

    /// MIME type of the file.
    pub content_type: String,

    pub body: PartBody,

    /// Modification time of the source file, for file-backed parts.
    pub last_modified: Option<SystemTime>,
}

impl BundlePart {
    /// A generated ASCII text part.
    pub fn text(filename: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: TEXT_CONTENT_TYPE.to_string(),
            body: PartBody::Inline(body.into()),
            last_modified: None,
        }
    }

    /// An embedded file part typed by extension.
    pub fn file(filename: impl Into<String>, body: Bytes, last_modified: Option<SystemTime>) -> Self {
        let filename = filename.into();
        Self {
            content_type: content_type_for(&filename).to_string(),
            filename,
            body: PartBody::Inline(body),
            last_modified,
        }
    }

    /// A file part served by reference.
    pub fn external(
        filename: impl Into<String>,
        url: impl Into<String>,
        length: u64,
        last_modified: Option<SystemTime>,
    ) -> Self {
        let filename = filename.into();
        Self {
            content_type: content_type_for(&filename).to_string(),
            filename,
            body: PartBody::External {
                url: url.into(),
                length,
            },
            last_modified,
        }
    }

    /// Size of the file this part stands for.
    pub fn len(&self) -> u64 {
        match &self.body {
            PartBody::Inline(bytes) => bytes.len() as u64,
            PartBody::External { length, .. } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedded bytes, if the part is not a reference.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.body {
            PartBody::Inline(bytes) => Some(bytes),
            PartBody::External { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_only_from_file_name() {
        assert_eq!(content_type_for("dir.dds/texture"), "application/octet-stream");
        assert_eq!(content_type_for("x.Png"), "image/png");
    }

    #[test]
    fn test_part_lengths() {
        let text = BundlePart::text("a/b.obj", "I\n800\nOBJ\n");
        assert_eq!(text.len(), 10);
        assert_eq!(text.content_type, TEXT_CONTENT_TYPE);

        let external = BundlePart::external("a/t.dds", "http://cdn/csl/a/t.dds", 4096, None);
        assert_eq!(external.len(), 4096);
        assert!(external.bytes().is_none());
        assert_eq!(external.content_type, "image/vnd.ms-dds");
    }
}
