//! Aircraft-type reference data.
//!
//! Two text files describe the ICAO type designators used for matching:
//!
//! - The classification table (ICAO Doc 8643 export) maps each designator to
//!   its class, engine count, engine type and wake category.
//! - The related-types file groups designators that are visually or
//!   operationally interchangeable.
//!
//! ```text
//! Cessna    172 Skyhawk    C172    L1P    L        <- classification table
//! A319 A320 A321 A20N A21N                         <- related-types group
//! ```

mod related;
mod table;

pub use related::{parse_relation_line, read_relation_groups, RelationGroup, RelationLine};
pub use table::{
    parse_classification_line, read_classification_table, ClassificationRecord,
    ClassificationTable, HELICOPTER_CLASS,
};
