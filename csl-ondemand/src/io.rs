//! Cancellable line-oriented file reading.
//!
//! All reference tables, manifests and model files are ASCII line formats.
//! Lines are read as bytes so that stray non-UTF-8 bytes in model files pass
//! through a rewrite untouched.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::error::{CslError, CslResult};

/// Race `future` against `cancel`; cancellation wins ties.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = T>,
) -> CslResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CslError::Cancelled),
        out = future => Ok(out),
    }
}

/// Normalize a relative `/`- or `\\`-separated path, resolving `.` and `..`.
///
/// Returns `None` for absolute paths and paths escaping their base.
pub(crate) fn normalize_relative(path: &str) -> Option<String> {
    if path.starts_with(['/', '\\']) {
        return None;
    }
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            segment => parts.push(segment),
        }
    }
    Some(parts.join("/"))
}

/// Reads a stream line by line, stripping `\n` / `\r\n` terminators.
pub(crate) struct LineReader<R> {
    reader: R,
    path: PathBuf,
    buf: Vec<u8>,
    line_number: usize,
}

/// Open `path` as a buffered async reader.
pub(crate) async fn open_buffered(
    path: &Path,
    cancel: &CancellationToken,
) -> CslResult<BufReader<File>> {
    let file = cancellable(cancel, File::open(path))
        .await?
        .map_err(|e| CslError::io(path, e))?;
    Ok(BufReader::new(file))
}

impl LineReader<BufReader<File>> {
    /// Open `path` for line reading.
    pub(crate) async fn open(path: &Path, cancel: &CancellationToken) -> CslResult<Self> {
        Ok(Self::new(open_buffered(path, cancel).await?, path))
    }
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Wrap an already-open reader; `path` is used for diagnostics only.
    pub(crate) fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            buf: Vec::with_capacity(256),
            line_number: 0,
        }
    }

    /// One-based number of the line most recently returned.
    pub(crate) fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next line, or `None` at end of stream.
    pub(crate) async fn next_line(&mut self, cancel: &CancellationToken) -> CslResult<Option<&[u8]>> {
        self.buf.clear();
        let read = cancellable(cancel, self.reader.read_until(b'\n', &mut self.buf))
            .await?
            .map_err(|e| CslError::io(&self.path, e))?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let mut end = self.buf.len();
        if end > 0 && self.buf[end - 1] == b'\n' {
            end -= 1;
        }
        if end > 0 && self.buf[end - 1] == b'\r' {
            end -= 1;
        }
        Ok(Some(&self.buf[..end]))
    }

    /// Read the next line as text, replacing invalid UTF-8.
    pub(crate) async fn next_text_line(
        &mut self,
        cancel: &CancellationToken,
    ) -> CslResult<Option<String>> {
        Ok(self
            .next_line(cancel)
            .await?
            .map(|line| String::from_utf8_lossy(line).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_lines_with_mixed_terminators() {
        let data: &[u8] = b"first\r\nsecond\n\nlast";
        let mut reader = LineReader::new(data, "mem");
        let cancel = CancellationToken::new();

        assert_eq!(reader.next_line(&cancel).await.unwrap(), Some(&b"first"[..]));
        assert_eq!(reader.next_line(&cancel).await.unwrap(), Some(&b"second"[..]));
        assert_eq!(reader.next_line(&cancel).await.unwrap(), Some(&b""[..]));
        assert_eq!(reader.next_line(&cancel).await.unwrap(), Some(&b"last"[..]));
        assert_eq!(reader.line_number(), 4);
        assert_eq!(reader.next_line(&cancel).await.unwrap(), None);
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative("C172/./tex.dds").as_deref(), Some("C172/tex.dds"));
        assert_eq!(normalize_relative("C172\\a\\..\\tex.dds").as_deref(), Some("C172/tex.dds"));
        assert_eq!(normalize_relative("C172/../Shared/t.png").as_deref(), Some("Shared/t.png"));
        assert_eq!(normalize_relative("").as_deref(), Some(""));
        assert_eq!(normalize_relative("../etc/passwd"), None);
        assert_eq!(normalize_relative("/etc/passwd"), None);
    }

    #[tokio::test]
    async fn test_cancelled_read_fails() {
        let data: &[u8] = b"line\n";
        let mut reader = LineReader::new(data, "mem");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = reader.next_line(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_open_missing_file_reports_path() {
        let cancel = CancellationToken::new();
        let err = match LineReader::open(Path::new("/nonexistent/xsb_aircraft.txt"), &cancel).await {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("/nonexistent/xsb_aircraft.txt"));
    }
}
