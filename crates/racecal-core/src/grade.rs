//! Grade and stage tables.
//!
//! Two pieces of static data drive calendar eligibility:
//! - the default display grade list per race type, and
//! - the grade/stage priority table for the mechanical-racing family.
//!
//! Both tables are append-only. Entries are never reordered or removed so
//! that eligibility of an existing record never changes silently.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::race_type::RaceType;

/// One row of the grade/stage priority table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeStagePriority {
    pub race_type: RaceType,
    pub grade: &'static str,
    pub stage: &'static str,
    pub priority: u8,
}

const fn row(race_type: RaceType, grade: &'static str, stage: &'static str, priority: u8) -> GradeStagePriority {
    GradeStagePriority {
        race_type,
        grade,
        stage,
        priority,
    }
}

use RaceType::{Autorace, Boatrace, Keirin};

/// The global grade/stage priority table.
pub static GRADE_STAGE_PRIORITIES: &[GradeStagePriority] = &[
    // keirin
    row(Keirin, "GP", "S級グランプリ", 9),
    row(Keirin, "GP", "L級ガールズグランプリ", 9),
    row(Keirin, "GⅠ", "S級決勝", 9),
    row(Keirin, "GⅠ", "L級ガールズ決勝", 8),
    row(Keirin, "GⅠ", "S級準決勝", 7),
    row(Keirin, "GⅠ", "S級スタールビー賞", 6),
    row(Keirin, "GⅠ", "S級特別優秀", 6),
    row(Keirin, "GⅠ", "S級特選", 5),
    row(Keirin, "GⅠ", "S級選抜", 5),
    row(Keirin, "GⅠ", "S級二次予選", 4),
    row(Keirin, "GⅠ", "S級一次予選", 3),
    row(Keirin, "GⅡ", "S級決勝", 8),
    row(Keirin, "GⅡ", "S級準決勝", 6),
    row(Keirin, "GⅡ", "S級特選", 4),
    row(Keirin, "GⅡ", "S級二次予選", 3),
    row(Keirin, "GⅡ", "S級一次予選", 2),
    row(Keirin, "GⅢ", "S級決勝", 7),
    row(Keirin, "GⅢ", "S級準決勝", 4),
    row(Keirin, "GⅢ", "S級特選", 3),
    row(Keirin, "GⅢ", "S級予選", 2),
    row(Keirin, "GⅢ", "L級ガールズ決勝", 4),
    row(Keirin, "FⅠ", "S級決勝", 4),
    row(Keirin, "FⅠ", "S級準決勝", 2),
    row(Keirin, "FⅠ", "A級決勝", 1),
    // autorace
    row(Autorace, "SG", "優勝戦", 9),
    row(Autorace, "SG", "準決勝戦", 7),
    row(Autorace, "SG", "特別選抜戦", 5),
    row(Autorace, "SG", "予選", 3),
    row(Autorace, "特GⅠ", "優勝戦", 8),
    row(Autorace, "特GⅠ", "準決勝戦", 5),
    row(Autorace, "特GⅠ", "予選", 2),
    row(Autorace, "GⅠ", "優勝戦", 7),
    row(Autorace, "GⅠ", "準決勝戦", 4),
    row(Autorace, "GⅠ", "予選", 2),
    row(Autorace, "GⅡ", "優勝戦", 5),
    row(Autorace, "GⅡ", "準決勝戦", 3),
    row(Autorace, "開催", "優勝戦", 2),
    // boatrace
    row(Boatrace, "SG", "優勝戦", 9),
    row(Boatrace, "SG", "準優勝戦", 7),
    row(Boatrace, "SG", "ドリーム戦", 6),
    row(Boatrace, "SG", "予選特選", 4),
    row(Boatrace, "SG", "予選", 3),
    row(Boatrace, "GⅠ", "優勝戦", 8),
    row(Boatrace, "GⅠ", "準優勝戦", 5),
    row(Boatrace, "GⅠ", "ドリーム戦", 4),
    row(Boatrace, "GⅠ", "予選", 2),
    row(Boatrace, "GⅡ", "優勝戦", 6),
    row(Boatrace, "GⅡ", "準優勝戦", 3),
    row(Boatrace, "GⅢ", "優勝戦", 4),
    row(Boatrace, "一般", "優勝戦", 2),
];

/// Looks up the priority of a (grade, stage) pair. Unknown pairs are 0.
pub fn priority(race_type: RaceType, grade: &str, stage: &str) -> u8 {
    GRADE_STAGE_PRIORITIES
        .iter()
        .find(|row| row.race_type == race_type && row.grade == grade && row.stage == stage)
        .map(|row| row.priority)
        .unwrap_or(0)
}

/// All grades known for a race type, most prestigious first.
pub fn known_grades(race_type: RaceType) -> &'static [&'static str] {
    match race_type {
        RaceType::Jra => &[
            "GⅠ", "GⅡ", "GⅢ", "J.GⅠ", "J.GⅡ", "J.GⅢ", "Listed", "オープン特別", "3勝クラス",
            "2勝クラス", "1勝クラス", "未勝利", "新馬",
        ],
        RaceType::Nar => &[
            "GⅠ", "GⅡ", "GⅢ", "JpnⅠ", "JpnⅡ", "JpnⅢ", "重賞", "地方重賞", "オープン", "一般",
        ],
        RaceType::World => &["GⅠ", "GⅡ", "GⅢ", "Listed", "格付けなし"],
        RaceType::Keirin => &["GP", "GⅠ", "GⅡ", "GⅢ", "FⅠ", "FⅡ"],
        RaceType::Autorace => &["SG", "特GⅠ", "GⅠ", "GⅡ", "開催"],
        RaceType::Boatrace => &["SG", "GⅠ", "GⅡ", "GⅢ", "一般"],
    }
}

/// Grades shown on the calendar when no override is configured.
pub fn default_display_grades(race_type: RaceType) -> &'static [&'static str] {
    match race_type {
        RaceType::Jra => &["GⅠ", "GⅡ", "GⅢ", "J.GⅠ", "J.GⅡ", "J.GⅢ"],
        RaceType::Nar => &["GⅠ", "GⅡ", "GⅢ", "JpnⅠ", "JpnⅡ", "JpnⅢ", "重賞"],
        RaceType::World => &["GⅠ"],
        RaceType::Keirin => &["GP", "GⅠ", "GⅡ", "GⅢ", "FⅠ"],
        RaceType::Autorace => &["SG", "特GⅠ", "GⅠ", "GⅡ"],
        RaceType::Boatrace => &["SG", "GⅠ", "GⅡ", "GⅢ"],
    }
}

/// Per-race-type display grade lists.
///
/// Race types without an entry fall back to [`default_display_grades`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayGrades {
    overrides: HashMap<RaceType, BTreeSet<String>>,
}

impl DisplayGrades {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the display list for one race type.
    pub fn with_grades<I, S>(mut self, race_type: RaceType, grades: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides
            .insert(race_type, grades.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if `grade` is in the display list for `race_type`.
    pub fn contains(&self, race_type: RaceType, grade: &str) -> bool {
        match self.overrides.get(&race_type) {
            Some(grades) => grades.contains(grade),
            None => default_display_grades(race_type).contains(&grade),
        }
    }

    /// Returns the effective display list for `race_type`.
    pub fn grades(&self, race_type: RaceType) -> Vec<String> {
        match self.overrides.get(&race_type) {
            Some(grades) => grades.iter().cloned().collect(),
            None => default_display_grades(race_type)
                .iter()
                .map(|g| g.to_string())
                .collect(),
        }
    }

    /// Grades configured for a race type that the grade table does not know.
    ///
    /// Not an error, but almost certainly a typo in configuration.
    pub fn unknown_grades(&self, race_type: RaceType) -> Vec<String> {
        let known = known_grades(race_type);
        self.grades(race_type)
            .into_iter()
            .filter(|g| !known.contains(&g.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_lookup() {
        assert_eq!(priority(Keirin, "GⅠ", "S級決勝"), 9);
        assert_eq!(priority(Keirin, "GⅠ", "S級一次予選"), 3);
        assert_eq!(priority(Boatrace, "SG", "優勝戦"), 9);
        // Same pair, different race type.
        assert_eq!(priority(Autorace, "SG", "準優勝戦"), 0);
        assert_eq!(priority(Keirin, "GⅠ", "存在しない"), 0);
    }

    #[test]
    fn table_has_no_duplicate_keys() {
        for (i, a) in GRADE_STAGE_PRIORITIES.iter().enumerate() {
            for b in &GRADE_STAGE_PRIORITIES[i + 1..] {
                assert!(
                    !(a.race_type == b.race_type && a.grade == b.grade && a.stage == b.stage),
                    "duplicate row {:?}",
                    a
                );
            }
        }
    }

    #[test]
    fn table_only_covers_mechanical_family() {
        assert!(
            GRADE_STAGE_PRIORITIES
                .iter()
                .all(|row| row.race_type.is_mechanical_racing())
        );
    }

    #[test]
    fn table_grades_are_known() {
        for row in GRADE_STAGE_PRIORITIES {
            assert!(known_grades(row.race_type).contains(&row.grade), "{:?}", row);
        }
    }

    #[test]
    fn display_grades_default_and_override() {
        let grades = DisplayGrades::new().with_grades(RaceType::World, ["GⅠ", "GⅡ"]);
        assert!(grades.contains(RaceType::World, "GⅡ"));
        assert!(!grades.contains(RaceType::World, "GⅢ"));
        assert!(grades.contains(RaceType::Jra, "GⅢ"));
        assert!(!grades.contains(RaceType::Jra, "未勝利"));
        assert_eq!(grades.grades(RaceType::World), vec!["GⅠ", "GⅡ"]);
    }

    #[test]
    fn unknown_configured_grades() {
        let grades = DisplayGrades::new().with_grades(RaceType::Keirin, ["GⅠ", "G1"]);
        assert_eq!(grades.unknown_grades(RaceType::Keirin), vec!["G1"]);
        assert!(grades.unknown_grades(RaceType::Boatrace).is_empty());
    }

    #[test]
    fn display_grades_deserialize_from_map() {
        let json = r#"{"keirin": ["GP", "GⅠ"]}"#;
        let grades: DisplayGrades = serde_json::from_str(json).unwrap();
        assert!(grades.contains(RaceType::Keirin, "GP"));
        assert!(!grades.contains(RaceType::Keirin, "GⅡ"));
    }
}
