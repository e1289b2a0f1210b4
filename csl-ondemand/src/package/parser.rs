//! `xsb_aircraft.txt` manifest parsing.
//!
//! The parser is a small state machine: `OBJ8_AIRCRAFT` opens a new aircraft
//! definition and subsequent lines attach to it until the next
//! `OBJ8_AIRCRAFT`, a deprecated `OBJECT`/`AIRCRAFT` block, or end of file.
//! An aircraft is only kept if it ends up with at least one `OBJ8` and one
//! selector.
//!
//! Malformed lines are logged and skipped; they never abort the parse.

use std::path::{Path, PathBuf};

use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::aircraft::{AircraftDefinition, Package};
use super::model::{MatchSelector, ObjectModelRef};
use crate::error::CslResult;
use crate::io::LineReader;

/// Start of a comment, both as a whole line and trailing a line.
const COMMENT: char = '#';

/// What the parser did with a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Comment, blank or keyword-only line.
    Ignored,
    /// The line was understood and applied.
    Applied,
    /// Keyword is not supported (or no longer supported); logged as a warning.
    Deprecated(String),
    /// Arity, context or number error; logged as an error.
    SyntaxError,
}

/// Incremental manifest parser for one package.
#[derive(Debug)]
pub struct ManifestParser {
    path: PathBuf,
    package: Package,
    current: Option<AircraftDefinition>,
}

impl ManifestParser {
    /// Create a parser for the package rooted at `root`.
    ///
    /// `path` is used for diagnostics only.
    pub fn new(path: impl Into<PathBuf>, root: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package: Package::new(root),
            current: None,
        }
    }

    /// Feed one line (without terminator). `line_number` is one-based.
    pub fn parse_line(&mut self, line_number: usize, line: &str) -> LineOutcome {
        if line.starts_with(COMMENT) {
            return LineOutcome::Ignored;
        }
        let content = match line.find(COMMENT) {
            Some(i) => &line[..i],
            None => line,
        };
        let mut tokens = content.split_whitespace();
        let Some(key) = tokens.next() else {
            return LineOutcome::Ignored;
        };
        let values: Vec<&str> = tokens.collect();
        if values.is_empty() {
            return LineOutcome::Ignored;
        }

        let outcome = self.apply(key, &values);
        match &outcome {
            LineOutcome::SyntaxError => error!(
                path = %self.path.display(),
                line_number,
                text = line.trim(),
                "Syntax error in CSL manifest"
            ),
            LineOutcome::Deprecated(key) => warn!(
                path = %self.path.display(),
                line_number,
                key = %key,
                "Unsupported or deprecated CSL keyword"
            ),
            _ => {}
        }
        outcome
    }

    fn apply(&mut self, key: &str, values: &[&str]) -> LineOutcome {
        match key {
            "EXPORT_NAME" => match values {
                [name] => {
                    self.package.export_names.insert(name.to_string());
                    LineOutcome::Applied
                }
                _ => LineOutcome::SyntaxError,
            },
            "OBJ8_AIRCRAFT" => {
                self.flush();
                match values {
                    [id] => {
                        self.current = Some(AircraftDefinition::new(self.package.root.clone(), *id));
                        LineOutcome::Applied
                    }
                    _ => LineOutcome::SyntaxError,
                }
            }
            "OBJ8" => {
                let object = ObjectModelRef::from_obj8_values(values);
                match (self.current.as_mut(), object) {
                    (Some(aircraft), Some(object)) => {
                        aircraft.objects.insert(object);
                        LineOutcome::Applied
                    }
                    _ => LineOutcome::SyntaxError,
                }
            }
            "VERT_OFFSET" => match values {
                [offset] => self.set_offset(offset),
                _ => LineOutcome::SyntaxError,
            },
            "OFFSET" => match values {
                [_, _, offset] => self.set_offset(offset),
                _ => LineOutcome::SyntaxError,
            },
            "MATCHES" | "LIVERY" | "AIRLINE" | "ICAO" => {
                let selector = MatchSelector::from_values(values);
                match (self.current.as_mut(), selector) {
                    (Some(aircraft), Some(selector)) => {
                        aircraft.selectors.insert(selector);
                        LineOutcome::Applied
                    }
                    _ => LineOutcome::SyntaxError,
                }
            }
            "OBJECT" | "AIRCRAFT" => {
                self.flush();
                LineOutcome::Deprecated(key.to_string())
            }
            other => LineOutcome::Deprecated(other.to_string()),
        }
    }

    fn set_offset(&mut self, value: &str) -> LineOutcome {
        match (self.current.as_mut(), value.parse::<f32>()) {
            (Some(aircraft), Ok(offset)) => {
                aircraft.vert_offset = Some(offset);
                LineOutcome::Applied
            }
            _ => LineOutcome::SyntaxError,
        }
    }

    /// Commit the aircraft under construction if it is complete.
    ///
    /// A block repeating an earlier id and offset extends that definition.
    fn flush(&mut self) {
        if let Some(aircraft) = self.current.take() {
            if aircraft.is_complete() {
                self.package.merge_aircraft(&aircraft);
            } else {
                debug!(
                    path = %self.path.display(),
                    id = %aircraft.id,
                    "Dropping aircraft without models or selectors"
                );
            }
        }
    }

    /// Flush the last aircraft and return the package.
    pub fn finish(mut self) -> Package {
        self.flush();
        self.package
    }
}

/// Parse a complete manifest stream into a [`Package`] rooted at `root`.
///
/// I/O failures and cancellation abort the parse; malformed lines do not.
pub async fn parse_manifest<R: AsyncBufRead + Unpin>(
    reader: R,
    path: &Path,
    root: impl Into<String>,
    cancel: &CancellationToken,
) -> CslResult<Package> {
    let mut parser = ManifestParser::new(path, root);
    let mut lines = LineReader::new(reader, path);

    while let Some(line) = lines.next_text_line(cancel).await? {
        parser.parse_line(lines.line_number(), &line);
    }

    let package = parser.finish();
    debug!(
        path = %path.display(),
        root = %package.root,
        exports = package.export_names.len(),
        aircraft = package.aircraft().len(),
        "CSL manifest parsed"
    );
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\
# Sample package
EXPORT_NAME B738
EXPORT_NAME B738_EXTRA   # trailing comment

OBJ8_AIRCRAFT B738_DLH
OBJ8 SOLID YES B738/b738.obj dlh.dds dlh_LIT.dds
VERT_OFFSET 2.5
MATCHES B738 DLH
AIRLINE B738 DLH STAR

OBJ8_AIRCRAFT B738_NOMATCH
OBJ8 SOLID YES B738/b738.obj

OBJ8_AIRCRAFT B738_NOOBJ
MATCHES B738

OBJ8_AIRCRAFT B738_GEN
OBJ8 GLASS NO B738:b738.obj
OFFSET 0 0 -1.5
ICAO B738
";

    fn parse(text: &str) -> Package {
        let mut parser = ManifestParser::new("B738/xsb_aircraft.txt", "B738");
        for (i, line) in text.lines().enumerate() {
            parser.parse_line(i + 1, line);
        }
        parser.finish()
    }

    #[test]
    fn test_parse_sample_package() {
        let package = parse(MANIFEST);

        assert_eq!(package.root, "B738");
        assert_eq!(package.export_names.len(), 2);
        assert!(package.export_names.contains("B738_EXTRA"));

        let ids: Vec<_> = package.aircraft().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["B738_DLH", "B738_GEN"]);

        let dlh = &package.aircraft()[0];
        assert_eq!(dlh.root, "B738");
        assert_eq!(dlh.vert_offset, Some(2.5));
        assert_eq!(dlh.selectors.len(), 2);
        assert!(dlh
            .selectors
            .contains(&MatchSelector::new("B738", Some("DLH"), Some("STAR"))));

        let generic = &package.aircraft()[1];
        assert_eq!(generic.vert_offset, Some(-1.5));
        assert_eq!(generic.objects.len(), 1);
    }

    #[test]
    fn test_outcomes() {
        let mut parser = ManifestParser::new("p", "P");
        assert_eq!(parser.parse_line(1, "# comment"), LineOutcome::Ignored);
        assert_eq!(parser.parse_line(2, "   "), LineOutcome::Ignored);
        assert_eq!(parser.parse_line(3, "EXPORT_NAME"), LineOutcome::Ignored);
        assert_eq!(parser.parse_line(4, "EXPORT_NAME # nothing"), LineOutcome::Ignored);
        assert_eq!(parser.parse_line(5, "EXPORT_NAME A B"), LineOutcome::SyntaxError);
        assert_eq!(parser.parse_line(6, "MATCHES A320"), LineOutcome::SyntaxError);
        assert_eq!(parser.parse_line(7, "VERT_OFFSET 1"), LineOutcome::SyntaxError);
        assert_eq!(parser.parse_line(8, "OBJ8_AIRCRAFT A B"), LineOutcome::SyntaxError);
        assert_eq!(parser.parse_line(9, "OBJ8_AIRCRAFT A"), LineOutcome::Applied);
        assert_eq!(parser.parse_line(10, "VERT_OFFSET abc"), LineOutcome::SyntaxError);
        assert_eq!(parser.parse_line(11, "OFFSET 1 2"), LineOutcome::SyntaxError);
        assert_eq!(parser.parse_line(12, "OBJ8 SOLID YES noslash.obj"), LineOutcome::SyntaxError);
        assert_eq!(
            parser.parse_line(13, "MATCHES A320 DLH X Y"),
            LineOutcome::SyntaxError
        );
        assert_eq!(
            parser.parse_line(14, "HASGEAR YES"),
            LineOutcome::Deprecated("HASGEAR".to_string())
        );
    }

    #[test]
    fn test_deprecated_block_closes_aircraft() {
        let package = parse(
            "OBJ8_AIRCRAFT A\nOBJ8 SOLID YES P/a.obj\nMATCHES A320\nAIRCRAFT 6.0 6.0 x.acf\nMATCHES A321\n",
        );
        assert_eq!(package.aircraft().len(), 1);
        assert_eq!(package.aircraft()[0].selectors.len(), 1);
    }

    #[test]
    fn test_invalid_obj8_aircraft_still_flushes() {
        let package = parse("OBJ8_AIRCRAFT A\nOBJ8 SOLID YES P/a.obj\nMATCHES A320\nOBJ8_AIRCRAFT\nOBJ8_AIRCRAFT B C\nMATCHES A321\n");
        assert_eq!(package.aircraft().len(), 1);
        assert_eq!(package.aircraft()[0].selectors.len(), 1);
    }

    #[test]
    fn test_leading_whitespace_is_allowed() {
        let package = parse("   OBJ8_AIRCRAFT A\n\tOBJ8 SOLID YES P/a.obj\n  MATCHES A320\n");
        assert_eq!(package.aircraft().len(), 1);
    }

    #[test]
    fn test_repeated_block_extends_definition() {
        let package = parse(
            "OBJ8_AIRCRAFT A\nOBJ8 SOLID YES P/a.obj\nMATCHES A320\n\
             OBJ8_AIRCRAFT A\nOBJ8 SOLID YES P/b.obj\nMATCHES A321 DLH\n\
             OBJ8_AIRCRAFT A\nOBJ8 SOLID YES P/c.obj\nVERT_OFFSET 1.5\nMATCHES A319\n",
        );

        assert_eq!(package.aircraft().len(), 2);
        let merged = &package.aircraft()[0];
        assert_eq!(merged.vert_offset, None);
        assert_eq!(merged.objects.len(), 2);
        assert!(merged.selectors.contains(&MatchSelector::new("A320", None, None)));
        assert!(merged.selectors.contains(&MatchSelector::new("A321", Some("DLH"), None)));
        assert_eq!(package.aircraft()[1].vert_offset, Some(1.5));

        let index = crate::index::PackageIndex::from_packages(vec![package.with_export("P")]);
        assert_eq!(index.duplicates(), 1);
        assert_eq!(index.get("B738", "A").unwrap().selectors.len(), 2);
    }

    #[tokio::test]
    async fn test_parse_manifest_stream() {
        let cancel = CancellationToken::new();
        let package = parse_manifest(
            MANIFEST.as_bytes(),
            Path::new("B738/xsb_aircraft.txt"),
            "B738",
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(package, parse(MANIFEST));
    }

    #[tokio::test]
    async fn test_parse_manifest_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = parse_manifest(MANIFEST.as_bytes(), Path::new("m"), "B738", &cancel).await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
