//! Venue code tables.
//!
//! Every race type has its own static table mapping venue names to 2-digit
//! codes. The [`CodeDialect::Registry`] code is the canonical one used in
//! identities; some sources report venues by a [`CodeDialect::Display`] code
//! instead, which only ever gets translated back to a venue name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::race_type::RaceType;

/// A 2-digit venue code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationCode(pub(crate) u8);

impl LocationCode {
    /// Creates a code, rejecting values that do not fit in two digits.
    pub fn new(code: u8) -> Option<Self> {
        (code < 100).then_some(Self(code))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Which code table to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodeDialect {
    /// Official registry code. Canonical for identities.
    #[default]
    Registry,
    /// Code used by third-party schedule pages.
    Display,
}

/// One row of a venue table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Venue {
    pub name: &'static str,
    pub registry: u8,
    pub display: Option<u8>,
}

const fn venue(name: &'static str, registry: u8) -> Venue {
    Venue {
        name,
        registry,
        display: None,
    }
}

const fn venue_with_display(name: &'static str, registry: u8, display: u8) -> Venue {
    Venue {
        name,
        registry,
        display: Some(display),
    }
}

static JRA_VENUES: &[Venue] = &[
    venue_with_display("札幌", 1, 1),
    venue_with_display("函館", 2, 2),
    venue_with_display("福島", 3, 3),
    venue_with_display("新潟", 4, 4),
    venue_with_display("東京", 5, 5),
    venue_with_display("中山", 6, 6),
    venue_with_display("中京", 7, 7),
    venue_with_display("京都", 8, 8),
    venue_with_display("阪神", 9, 9),
    venue_with_display("小倉", 10, 10),
];

static NAR_VENUES: &[Venue] = &[
    venue_with_display("帯広ば", 3, 65),
    venue_with_display("門別", 36, 30),
    venue_with_display("盛岡", 10, 35),
    venue_with_display("水沢", 11, 36),
    venue_with_display("浦和", 18, 42),
    venue_with_display("船橋", 19, 43),
    venue_with_display("大井", 20, 44),
    venue_with_display("川崎", 21, 45),
    venue_with_display("金沢", 22, 46),
    venue_with_display("笠松", 23, 47),
    venue_with_display("名古屋", 24, 48),
    venue_with_display("園田", 27, 50),
    venue_with_display("姫路", 28, 51),
    venue_with_display("高知", 31, 54),
    venue_with_display("佐賀", 32, 55),
];

static WORLD_VENUES: &[Venue] = &[
    venue("パリロンシャン", 1),
    venue("シャンティイ", 2),
    venue("ドーヴィル", 3),
    venue("サンクルー", 4),
    venue("アスコット", 5),
    venue("エプソム", 6),
    venue("ニューマーケット", 7),
    venue("グッドウッド", 8),
    venue("ヨーク", 9),
    venue("カラ", 10),
    venue("レパーズタウン", 11),
    venue("チャーチルダウンズ", 12),
    venue("サンタアニタパーク", 13),
    venue("ベルモントパーク", 14),
    venue("デルマー", 15),
    venue("メイダン", 16),
    venue("キングアブドゥルアジーズ", 17),
    venue("シャティン", 18),
    venue("フレミントン", 19),
    venue("ランドウィック", 20),
];

static KEIRIN_VENUES: &[Venue] = &[
    venue("函館", 11),
    venue("青森", 12),
    venue("いわき平", 13),
    venue("弥彦", 21),
    venue("前橋", 22),
    venue("取手", 23),
    venue("宇都宮", 24),
    venue("大宮", 25),
    venue("西武園", 26),
    venue("京王閣", 27),
    venue("立川", 28),
    venue("松戸", 31),
    venue("千葉", 32),
    venue("川崎", 34),
    venue("平塚", 35),
    venue("小田原", 36),
    venue("伊東", 37),
    venue("静岡", 38),
    venue("名古屋", 42),
    venue("岐阜", 43),
    venue("大垣", 44),
    venue("豊橋", 45),
    venue("富山", 46),
    venue("松阪", 47),
    venue("四日市", 48),
    venue("福井", 51),
    venue("奈良", 53),
    venue("向日町", 54),
    venue("和歌山", 55),
    venue("岸和田", 56),
    venue("玉野", 61),
    venue("広島", 62),
    venue("防府", 63),
    venue("高松", 71),
    venue("小松島", 73),
    venue("高知", 74),
    venue("松山", 75),
    venue("小倉", 81),
    venue("久留米", 83),
    venue("武雄", 84),
    venue("佐世保", 85),
    venue("別府", 86),
    venue("熊本", 87),
];

static AUTORACE_VENUES: &[Venue] = &[
    venue("川口", 2),
    venue("伊勢崎", 3),
    venue("浜松", 4),
    venue("飯塚", 5),
    venue("山陽", 6),
];

static BOATRACE_VENUES: &[Venue] = &[
    venue("桐生", 1),
    venue("戸田", 2),
    venue("江戸川", 3),
    venue("平和島", 4),
    venue("多摩川", 5),
    venue("浜名湖", 6),
    venue("蒲郡", 7),
    venue("常滑", 8),
    venue("津", 9),
    venue("三国", 10),
    venue("びわこ", 11),
    venue("住之江", 12),
    venue("尼崎", 13),
    venue("鳴門", 14),
    venue("丸亀", 15),
    venue("児島", 16),
    venue("宮島", 17),
    venue("徳山", 18),
    venue("下関", 19),
    venue("若松", 20),
    venue("芦屋", 21),
    venue("福岡", 22),
    venue("唐津", 23),
    venue("大村", 24),
];

/// Returns the venue table for a race type.
pub fn venues(race_type: RaceType) -> &'static [Venue] {
    match race_type {
        RaceType::Jra => JRA_VENUES,
        RaceType::Nar => NAR_VENUES,
        RaceType::World => WORLD_VENUES,
        RaceType::Keirin => KEIRIN_VENUES,
        RaceType::Autorace => AUTORACE_VENUES,
        RaceType::Boatrace => BOATRACE_VENUES,
    }
}

/// Looks up the code for a venue name in the given dialect.
pub fn lookup_code(race_type: RaceType, name: &str, dialect: CodeDialect) -> Option<LocationCode> {
    let name = name.trim();
    venues(race_type)
        .iter()
        .find(|v| v.name == name)
        .and_then(|v| match dialect {
            CodeDialect::Registry => Some(v.registry),
            CodeDialect::Display => v.display,
        })
        .map(LocationCode)
}

/// Looks up the canonical (registry) code for a venue name.
pub fn canonical_code(race_type: RaceType, name: &str) -> Option<LocationCode> {
    lookup_code(race_type, name, CodeDialect::Registry)
}

/// Resolves a code in the given dialect back to a venue name.
pub fn venue_name(race_type: RaceType, code: u8, dialect: CodeDialect) -> Option<&'static str> {
    venues(race_type)
        .iter()
        .find(|v| match dialect {
            CodeDialect::Registry => v.registry == code,
            CodeDialect::Display => v.display == Some(code),
        })
        .map(|v| v.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_codes_unique_per_race_type() {
        for rt in RaceType::ALL {
            let mut seen = HashSet::new();
            for v in venues(rt) {
                assert!(v.registry < 100, "{} code too wide", v.name);
                assert!(seen.insert(v.registry), "{} duplicate code {}", rt, v.registry);
            }
        }
    }

    #[test]
    fn same_name_different_codes_across_types() {
        assert_eq!(canonical_code(RaceType::Jra, "函館").unwrap().value(), 2);
        assert_eq!(canonical_code(RaceType::Keirin, "函館").unwrap().value(), 11);
        assert_eq!(canonical_code(RaceType::Nar, "川崎").unwrap().value(), 21);
        assert_eq!(canonical_code(RaceType::Keirin, "川崎").unwrap().value(), 34);
    }

    #[test]
    fn display_dialect_is_not_canonical() {
        assert_eq!(canonical_code(RaceType::Nar, "大井").unwrap().value(), 20);
        assert_eq!(
            lookup_code(RaceType::Nar, "大井", CodeDialect::Display)
                .unwrap()
                .value(),
            44
        );
        assert_eq!(venue_name(RaceType::Nar, 44, CodeDialect::Display), Some("大井"));
        assert_eq!(venue_name(RaceType::Nar, 44, CodeDialect::Registry), None);
        assert_eq!(lookup_code(RaceType::Keirin, "弥彦", CodeDialect::Display), None);
    }

    #[test]
    fn unknown_venue() {
        assert!(canonical_code(RaceType::Boatrace, "東京").is_none());
        assert!(venue_name(RaceType::Autorace, 1, CodeDialect::Registry).is_none());
    }

    #[test]
    fn code_formatting() {
        assert_eq!(LocationCode::new(5).unwrap().to_string(), "05");
        assert_eq!(LocationCode::new(21).unwrap().to_string(), "21");
        assert!(LocationCode::new(100).is_none());
    }
}
