//! `multipart/mixed` rendering of a bundle.

use std::time::SystemTime;

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;

use super::part::{BundlePart, PartBody};

/// Length of generated multipart boundaries.
pub const BOUNDARY_LENGTH: usize = 32;

/// Generate a random multipart boundary.
pub fn generate_boundary() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_LENGTH)
        .map(char::from)
        .collect()
}

/// Format a timestamp as an HTTP-date (`Tue, 15 Nov 1994 08:12:31 GMT`).
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Top-level `Content-Type` header value for a body using `boundary`.
pub fn multipart_content_type(boundary: &str) -> String {
    format!("multipart/mixed; boundary=\"{}\"", boundary)
}

/// Render `parts` as a `multipart/mixed` body.
pub fn render_multipart(parts: &[BundlePart], boundary: &str) -> Bytes {
    let capacity = parts.iter().map(|p| p.bytes().map_or(0, |b| b.len()) + 256).sum();
    let mut out = BytesMut::with_capacity(capacity);

    for part in parts {
        out.put_slice(b"--");
        out.put_slice(boundary.as_bytes());
        out.put_slice(b"\r\n");
        write_headers(&mut out, part);
        out.put_slice(b"\r\n");
        if let PartBody::Inline(body) = &part.body {
            out.put_slice(body);
        }
        out.put_slice(b"\r\n");
    }
    out.put_slice(b"--");
    out.put_slice(boundary.as_bytes());
    out.put_slice(b"--\r\n");
    out.freeze()
}

fn write_headers(out: &mut BytesMut, part: &BundlePart) {
    let mut header = |name: &str, value: &str| {
        out.put_slice(name.as_bytes());
        out.put_slice(b": ");
        out.put_slice(value.as_bytes());
        out.put_slice(b"\r\n");
    };

    match &part.body {
        PartBody::Inline(body) => {
            header("Content-Type", &part.content_type);
            header("Content-Length", &body.len().to_string());
        }
        PartBody::External { url, .. } => {
            header(
                "Content-Type",
                &format!("message/external-body; access-type=URL; URL=\"{}\"", url),
            );
            header("Content-Length", "0");
        }
    }
    header(
        "Content-Disposition",
        &format!("attachment; filename=\"{}\"", part.filename.replace('"', "\\\"")),
    );
    if let Some(modified) = part.last_modified {
        header("Last-Modified", &http_date(modified));
    }
}
