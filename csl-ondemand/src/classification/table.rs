//! Classification table parsing.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::related::RelationGroup;
use crate::error::CslResult;
use crate::io::LineReader;

/// Class-type letter identifying helicopters.
pub const HELICOPTER_CLASS: char = 'H';

/// Tab-delimited record: optional free-text prefix, designator, a three
/// character class/engine-count/engine-type code and the wake category.
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // (?:.*\t)?        - free-text columns (manufacturer, model), optional
        // ([0-9A-Z]+)      - designator
        // ([A-Z])([0-9])([A-Z]) - class type, engine count, engine type
        // ([A-Z])          - wake category
        Regex::new(
            r"^(?:.*\t)?(?P<designator>[0-9A-Z]+)\t(?P<class>[A-Z])(?P<engines>[0-9])(?P<engine_type>[A-Z])\t(?P<wake>[A-Z])$",
        )
        .unwrap()
    })
}

/// Physical and operational attributes of one ICAO type designator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRecord {
    /// ICAO type designator (e.g. `C172`).
    pub designator: String,

    /// Class letter: `L` landplane, `S` seaplane, `A` amphibian, `H` helicopter, ...
    pub class_type: char,

    /// Number of engines.
    pub engine_count: u8,

    /// Engine type letter: `P` piston, `T` turboprop, `J` jet, ...
    pub engine_type: char,

    /// Wake turbulence category letter: `L`, `M`, `H`, `J`.
    pub wake_category: char,

    related: Option<Arc<BTreeSet<String>>>,
}

impl ClassificationRecord {
    /// Create a record without relation-group membership.
    pub fn new(
        designator: impl Into<String>,
        class_type: char,
        engine_count: u8,
        engine_type: char,
        wake_category: char,
    ) -> Self {
        Self {
            designator: designator.into(),
            class_type,
            engine_count,
            engine_type,
            wake_category,
            related: None,
        }
    }

    /// The relation group this designator belongs to, including itself.
    ///
    /// When present it has at least two members.
    pub fn related(&self) -> Option<&BTreeSet<String>> {
        self.related.as_deref()
    }

    /// Whether `designator` is in this record's relation group.
    pub fn is_related_to(&self, designator: &str) -> bool {
        self.related
            .as_ref()
            .is_some_and(|group| group.contains(designator))
    }

    /// Whether this designator is a helicopter.
    pub fn is_helicopter(&self) -> bool {
        self.class_type == HELICOPTER_CLASS
    }
}

/// Parse one classification table line.
///
/// Lines not matching the record layout (headers, footers, malformed codes)
/// yield `None`.
///
/// # Example
///
/// ```
/// use csl_ondemand::classification::parse_classification_line;
///
/// let record = parse_classification_line("CESSNA\t172 Skyhawk\tC172\tL1P\tL").unwrap();
/// assert_eq!(record.designator, "C172");
/// assert_eq!(record.class_type, 'L');
/// assert_eq!(record.engine_count, 1);
/// assert_eq!(record.engine_type, 'P');
/// assert_eq!(record.wake_category, 'L');
///
/// assert!(parse_classification_line("C172\tL1\tL").is_none());
/// ```
pub fn parse_classification_line(line: &str) -> Option<ClassificationRecord> {
    let caps = line_pattern().captures(line)?;
    let letter = |name: &str| caps.name(name).and_then(|m| m.as_str().chars().next());
    let engine_count = caps
        .name("engines")
        .and_then(|m| m.as_str().parse::<u8>().ok())?;

    Some(ClassificationRecord::new(
        caps.name("designator")?.as_str(),
        letter("class")?,
        engine_count,
        letter("engine_type")?,
        letter("wake")?,
    ))
}

/// Designator → classification record lookup.
#[derive(Debug, Clone, Default)]
pub struct ClassificationTable {
    records: HashMap<String, ClassificationRecord>,
}

impl ClassificationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whole table held in memory.
    pub fn parse_str(content: &str) -> Self {
        let mut table = Self::new();
        for record in content.lines().filter_map(parse_classification_line) {
            table.insert(record);
        }
        table
    }

    /// Insert a record; a later record for the same designator replaces the earlier one.
    pub fn insert(&mut self, record: ClassificationRecord) {
        self.records.insert(record.designator.clone(), record);
    }

    /// Look up a designator.
    pub fn get(&self, designator: &str) -> Option<&ClassificationRecord> {
        self.records.get(designator)
    }

    /// Number of designators.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate all records in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassificationRecord> {
        self.records.values()
    }

    /// Annotate every known member of `group` with the whole group.
    ///
    /// Returns the number of records annotated. Designators absent from the
    /// table are ignored.
    pub fn apply_relation_group(&mut self, group: &RelationGroup) -> usize {
        let members = Arc::new(group.members().clone());
        let mut annotated = 0;
        for designator in group.members() {
            if let Some(record) = self.records.get_mut(designator) {
                record.related = Some(Arc::clone(&members));
                annotated += 1;
            }
        }
        annotated
    }
}

/// Read a classification table from `reader`.
///
/// `path` is used for diagnostics only.
pub async fn read_classification_table<R: AsyncBufRead + Unpin>(
    reader: R,
    path: &Path,
    cancel: &CancellationToken,
) -> CslResult<ClassificationTable> {
    let mut lines = LineReader::new(reader, path);
    let mut table = ClassificationTable::new();
    let mut skipped = 0usize;

    while let Some(line) = lines.next_text_line(cancel).await? {
        match parse_classification_line(&line) {
            Some(record) => table.insert(record),
            None => skipped += 1,
        }
    }

    debug!(
        path = %path.display(),
        records = table.len(),
        skipped,
        "Classification table read"
    );
    Ok(table)
}
