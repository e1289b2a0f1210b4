//! Match quality scoring.

use crate::classification::ClassificationRecord;
use crate::package::MatchSelector;

use super::MatchQuery;

/// Weight of a livery mismatch.
pub const LIVERY_WEIGHT: u16 = 0b00_0000_0001;

/// Weight of an operator mismatch (includes a secondary bit so that operator
/// outranks livery).
pub const OPERATOR_WEIGHT: u16 = 0b00_0000_1010;

/// Weight of an ICAO type designator mismatch.
pub const ICAO_WEIGHT: u16 = 0b00_0000_0100;

/// Weight of a selector type not in the requested type's related group.
pub const NOT_RELATED_WEIGHT: u16 = 0b00_0001_1000;

/// Weight of a class-type mismatch (land plane, sea plane, helicopter...).
pub const CLASS_WEIGHT: u16 = 0b01_0010_0000;

/// Weight of an engine count mismatch.
pub const ENGINE_COUNT_WEIGHT: u16 = 0b00_0100_0000;

/// Weight of a wake category mismatch. Shares its bit with [`CLASS_WEIGHT`].
pub const WAKE_WEIGHT: u16 = 0b01_0000_0000;

/// Weight of exactly one side being a helicopter.
pub const HELICOPTER_WEIGHT: u16 = 0b10_0000_0000;

/// Weight applied when type attributes cannot be compared because the
/// requested or selector type is unclassified.
pub const UNCLASSIFIED_WEIGHT: u16 = 0b11_1111_1000;

/// Score of a selector matching nothing at all; also the starting best score.
pub const WORST_SCORE: u16 = 0b11_1111_1111;

/// Penalty factors of one selector against one query.
///
/// Factors are not mutually exclusive; [`score`](Self::score) ORs together the
/// weights of every factor present. Lower scores are better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchQuality {
    pub livery_mismatch: bool,
    pub operator_mismatch: bool,
    pub icao_mismatch: bool,
    /// Requested or selector type missing from the classification table.
    pub unclassified: bool,
    pub not_related: bool,
    pub class_mismatch: bool,
    pub engine_count_mismatch: bool,
    pub wake_mismatch: bool,
    pub helicopter_mismatch: bool,
}

impl MatchQuality {
    /// Compare `selector` against `query`.
    ///
    /// `requested` is the classification of the queried ICAO type and
    /// `selector_type` that of the selector's type, when known.
    pub fn assess(
        query: &MatchQuery,
        requested: Option<&ClassificationRecord>,
        selector: &MatchSelector,
        selector_type: Option<&ClassificationRecord>,
    ) -> Self {
        let differs = |wanted: Option<&str>, actual: Option<&str>| match wanted {
            Some(wanted) => actual != Some(wanted),
            None => false,
        };

        let mut quality = Self {
            livery_mismatch: differs(query.livery(), selector.livery.as_deref()),
            operator_mismatch: differs(query.operator(), selector.operator.as_deref()),
            icao_mismatch: differs(query.icao(), Some(selector.icao.as_str())),
            ..Self::default()
        };

        match (requested, selector_type) {
            (Some(requested), Some(other)) => {
                quality.not_related = !requested.is_related_to(&selector.icao);
                quality.class_mismatch = requested.class_type != other.class_type;
                quality.engine_count_mismatch = requested.engine_count != other.engine_count;
                quality.wake_mismatch = requested.wake_category != other.wake_category;
                quality.helicopter_mismatch = requested.is_helicopter() != other.is_helicopter();
            }
            _ => quality.unclassified = true,
        }
        quality
    }

    /// Combined score; lower is better.
    pub fn score(&self) -> u16 {
        [
            (self.livery_mismatch, LIVERY_WEIGHT),
            (self.operator_mismatch, OPERATOR_WEIGHT),
            (self.icao_mismatch, ICAO_WEIGHT),
            (self.unclassified, UNCLASSIFIED_WEIGHT),
            (self.not_related, NOT_RELATED_WEIGHT),
            (self.class_mismatch, CLASS_WEIGHT),
            (self.engine_count_mismatch, ENGINE_COUNT_WEIGHT),
            (self.wake_mismatch, WAKE_WEIGHT),
            (self.helicopter_mismatch, HELICOPTER_WEIGHT),
        ]
        .into_iter()
        .filter(|(present, _)| *present)
        .fold(0, |score, (_, weight)| score | weight)
    }
}
