//! Best-match search over indexed aircraft.
//!
//! Every selector of every registered aircraft is scored against the query
//! with [`MatchQuality`]. The aircraft owning the lowest-scoring selectors form
//! the candidate set and one of them is picked uniformly at random.
//!
//! # Example
//!
//! ```
//! use csl_ondemand::classification::ClassificationTable;
//! use csl_ondemand::index::PackageIndex;
//! use csl_ondemand::matcher::{MatchQuery, Matcher};
//!
//! let table = ClassificationTable::new();
//! let index = PackageIndex::default();
//! let matcher = Matcher::new(&table, &index);
//!
//! assert!(matcher.best_match(&MatchQuery::new(Some("A320"), None, None)).is_none());
//! ```

mod quality;

pub use quality::{
    MatchQuality, CLASS_WEIGHT, ENGINE_COUNT_WEIGHT, HELICOPTER_WEIGHT, ICAO_WEIGHT,
    LIVERY_WEIGHT, NOT_RELATED_WEIGHT, OPERATOR_WEIGHT, UNCLASSIFIED_WEIGHT, WAKE_WEIGHT,
    WORST_SCORE,
};

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::classification::ClassificationTable;
use crate::index::PackageIndex;
use crate::package::AircraftDefinition;

/// Requested ICAO type, operator and livery. Empty terms count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchQuery {
    icao: Option<String>,
    operator: Option<String>,
    livery: Option<String>,
}

impl MatchQuery {
    pub fn new(icao: Option<&str>, operator: Option<&str>, livery: Option<&str>) -> Self {
        fn term(value: Option<&str>) -> Option<String> {
            value.filter(|v| !v.is_empty()).map(str::to_string)
        }
        Self {
            icao: term(icao),
            operator: term(operator),
            livery: term(livery),
        }
    }

    pub fn icao(&self) -> Option<&str> {
        self.icao.as_deref()
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub fn livery(&self) -> Option<&str> {
        self.livery.as_deref()
    }
}

/// Scores aircraft in a [`PackageIndex`] using a [`ClassificationTable`].
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    classification: &'a ClassificationTable,
    index: &'a PackageIndex,
}

impl<'a> Matcher<'a> {
    pub fn new(classification: &'a ClassificationTable, index: &'a PackageIndex) -> Self {
        Self {
            classification,
            index,
        }
    }

    /// Find the best aircraft for `query` using the thread-local random source.
    pub fn best_match(&self, query: &MatchQuery) -> Option<Arc<AircraftDefinition>> {
        self.best_match_with(query, &mut rand::rng())
    }

    /// Find the best aircraft for `query`, breaking ties with `rng`.
    ///
    /// Falls back to a random registered aircraft when no selector scores at
    /// or below [`WORST_SCORE`], and returns `None` only for an empty index.
    pub fn best_match_with<R: Rng>(
        &self,
        query: &MatchQuery,
        rng: &mut R,
    ) -> Option<Arc<AircraftDefinition>> {
        let candidates = self.candidates(query);
        let pool = if candidates.is_empty() {
            (0..self.index.aircraft().len()).collect()
        } else {
            candidates
        };
        if pool.is_empty() {
            return None;
        }
        let chosen = pool[rng.random_range(0..pool.len())];
        Some(Arc::clone(&self.index.aircraft()[chosen]))
    }

    /// Indices of the best-scoring aircraft, each listed once.
    fn candidates(&self, query: &MatchQuery) -> Vec<usize> {
        let requested = query.icao().and_then(|icao| self.classification.get(icao));
        let mut best_score = WORST_SCORE;
        let mut best: Vec<usize> = Vec::new();

        for (i, aircraft) in self.index.aircraft().iter().enumerate() {
            for selector in &aircraft.selectors {
                let score = MatchQuality::assess(
                    query,
                    requested,
                    selector,
                    self.classification.get(&selector.icao),
                )
                .score();

                if score < best_score {
                    best_score = score;
                    best.clear();
                    best.push(i);
                } else if score == best_score && best.last() != Some(&i) {
                    best.push(i);
                }
            }
        }

        debug!(
            icao = query.icao(),
            operator = query.operator(),
            livery = query.livery(),
            score = best_score,
            candidates = best.len(),
            "Match candidates scored"
        );
        best
    }
}
