//! Calendar eligibility rules.
//!
//! - Horse-racing family: a record is shown iff its grade is in the display
//!   list for its race type.
//! - Mechanical family: additionally, the (grade, stage) pair must have a
//!   priority of at least [`PRIORITY_THRESHOLD`]. Pairs missing from the
//!   priority table count as priority 0 and are therefore never shown.

use tracing::debug;

use crate::grade::{self, DisplayGrades};
use crate::race_type::RaceFamily;
use crate::record::RaceRecord;

/// Minimum priority for a mechanical-racing record to be shown.
pub const PRIORITY_THRESHOLD: u8 = 4;

/// Decides which records are worth a calendar entry.
#[derive(Debug, Clone, Default)]
pub struct EligibilityFilter {
    display_grades: DisplayGrades,
}

impl EligibilityFilter {
    pub fn new(display_grades: DisplayGrades) -> Self {
        Self { display_grades }
    }

    pub fn display_grades(&self) -> &DisplayGrades {
        &self.display_grades
    }

    /// Returns true if `record` should appear on the calendar.
    pub fn is_eligible(&self, record: &RaceRecord) -> bool {
        let race_type = record.race_type();
        if !self.display_grades.contains(race_type, record.grade()) {
            return false;
        }
        match race_type.family() {
            RaceFamily::Horse => true,
            RaceFamily::Mechanical => {
                let priority = grade::priority(race_type, record.grade(), record.stage().unwrap_or_default());
                priority >= PRIORITY_THRESHOLD
            }
        }
    }

    /// Keeps only the eligible records.
    pub fn filter(&self, records: Vec<RaceRecord>) -> Vec<RaceRecord> {
        let total = records.len();
        let kept: Vec<RaceRecord> = records.into_iter().filter(|r| self.is_eligible(r)).collect();
        debug!(total, kept = kept.len(), excluded = total - kept.len(), "Applied eligibility filter");
        kept
    }
}
