//! Related-types grouping file parsing.

use std::collections::BTreeSet;
use std::path::Path;

use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CslResult;
use crate::io::LineReader;

/// Comment marker; only recognised as the first character of a line.
const COMMENT_PREFIX: char = ';';

/// A set of ICAO designators considered interchangeable for matching.
///
/// A group always has at least two distinct members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationGroup {
    members: BTreeSet<String>,
}

impl RelationGroup {
    /// Create a group; returns `None` with fewer than two distinct members.
    ///
    /// # Example
    ///
    /// ```
    /// use csl_ondemand::classification::RelationGroup;
    ///
    /// let group = RelationGroup::new(["B738", "B737", "B738"]).unwrap();
    /// assert_eq!(group.len(), 2);
    ///
    /// assert!(RelationGroup::new(["B738", "B738"]).is_none());
    /// ```
    pub fn new<I, S>(members: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: BTreeSet<String> = members.into_iter().map(Into::into).collect();
        (members.len() >= 2).then_some(Self { members })
    }

    /// Group members, including every designator on the line.
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Whether `designator` is a member.
    pub fn contains(&self, designator: &str) -> bool {
        self.members.contains(designator)
    }

    /// Number of distinct members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`; groups have at least two members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Outcome of parsing one line of the related-types file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationLine {
    /// Blank or comment line.
    Skip,

    /// A valid group.
    Group(RelationGroup),

    /// A line with fewer than two distinct designators.
    Invalid,
}

/// Parse one line of the related-types file.
pub fn parse_relation_line(line: &str) -> RelationLine {
    if line.starts_with(COMMENT_PREFIX) || line.trim().is_empty() {
        return RelationLine::Skip;
    }
    match RelationGroup::new(line.split_whitespace()) {
        Some(group) => RelationLine::Group(group),
        None => RelationLine::Invalid,
    }
}

/// Read all valid relation groups from `reader`.
///
/// Invalid lines are reported as warnings with their line number and text and
/// are not yielded.
pub async fn read_relation_groups<R: AsyncBufRead + Unpin>(
    reader: R,
    path: &Path,
    cancel: &CancellationToken,
) -> CslResult<Vec<RelationGroup>> {
    let mut lines = LineReader::new(reader, path);
    let mut groups = Vec::new();

    while let Some(line) = lines.next_text_line(cancel).await? {
        match parse_relation_line(&line) {
            RelationLine::Group(group) => groups.push(group),
            RelationLine::Invalid => warn!(
                line_number = lines.line_number(),
                text = line.trim(),
                "Unrelated type in related-types file"
            ),
            RelationLine::Skip => {}
        }
    }

    debug!(path = %path.display(), groups = groups.len(), "Related types read");
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::ClassificationTable;

    const RELATED_SAMPLE: &str = "\
; Airbus narrow-bodies
A319 A320 A321 A20N A21N

B737 B738 B739
C172
  \t
C172 C172
B744 B748 B744
";

    #[test]
    fn test_parse_relation_line() {
        assert_eq!(parse_relation_line("; comment A320 A321"), RelationLine::Skip);
        assert_eq!(parse_relation_line(""), RelationLine::Skip);
        assert_eq!(parse_relation_line("   "), RelationLine::Skip);
        assert_eq!(parse_relation_line("C172"), RelationLine::Invalid);
        assert_eq!(parse_relation_line("C172  C172"), RelationLine::Invalid);

        match parse_relation_line("  B737\tB738 B739 ") {
            RelationLine::Group(group) => {
                assert_eq!(group.len(), 3);
                assert!(group.contains("B738"));
            }
            other => panic!("expected a group, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_relation_groups_discards_invalid() {
        let cancel = CancellationToken::new();
        let groups = read_relation_groups(RELATED_SAMPLE.as_bytes(), Path::new("related.txt"), &cancel)
            .await
            .unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].len(), 5);
        assert_eq!(groups[2].len(), 2);
        assert!(groups.iter().all(|g| g.len() >= 2));
    }

    #[tokio::test]
    async fn test_groups_annotate_table_symmetrically() {
        let cancel = CancellationToken::new();
        let mut table = ClassificationTable::parse_str(
            "X\tA320\tL2J\tM\nX\tA21N\tL2J\tM\nX\tB738\tL2J\tM\nX\tC172\tL1P\tL\n",
        );
        let groups = read_relation_groups(RELATED_SAMPLE.as_bytes(), Path::new("related.txt"), &cancel)
            .await
            .unwrap();
        for group in &groups {
            table.apply_relation_group(group);
        }

        for record in table.iter() {
            if let Some(related) = record.related() {
                assert!(related.len() >= 2);
                assert!(related.contains(&record.designator));
                for member in related {
                    if let Some(other) = table.get(member) {
                        assert_eq!(other.related(), Some(related));
                    }
                }
            }
        }
        assert!(table.get("C172").unwrap().related().is_none());
        assert!(table.get("A320").unwrap().is_related_to("A21N"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_valid_groups_contain_every_member(
                members in proptest::collection::vec("[0-9A-Z]{3,4}", 2..8)
            ) {
                let line = members.join(" ");
                let distinct: BTreeSet<&String> = members.iter().collect();
                match parse_relation_line(&line) {
                    RelationLine::Group(group) => {
                        prop_assert!(distinct.len() >= 2);
                        for m in &members {
                            prop_assert!(group.contains(m));
                        }
                        prop_assert_eq!(group.len(), distinct.len());
                    }
                    RelationLine::Invalid => prop_assert!(distinct.len() < 2),
                    RelationLine::Skip => prop_assert!(false, "non-empty line skipped"),
                }
            }
        }
    }
}
