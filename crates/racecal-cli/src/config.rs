//! Client configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `$XDG_CONFIG_HOME/racecal/config.toml`. Every section is optional.
//!
//! ```toml
//! debug = false
//!
//! [sync]
//! race_types = ["jra", "keirin"]
//! window_days = 14
//! batch_size = 25
//! batch_pause_ms = 1000
//! source_fetch_delay_ms = 1000
//! parallel_race_types = false
//! sync_interval_secs = 3600
//!
//! [storage]
//! dir = "/var/lib/racecal/storage"
//!
//! [display_grades]
//! keirin = ["GP", "GⅠ"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use racecal_core::{DisplayGrades, RaceType};
use racecal_sync::SyncConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub debug: bool,

    pub sync: SyncSettings,

    /// Where canonical race records are kept.
    pub storage: StorageSettings,

    /// The calendar being kept in line.
    pub calendar: CalendarSettings,

    /// Raw race fixtures read by `ingest`.
    pub source: SourceSettings,

    /// Display grade lists by race type prefix. Race types not listed keep
    /// their built-in list.
    pub display_grades: BTreeMap<String, Vec<String>>,
}

/// Sync engine settings, in file-friendly units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub race_types: Vec<RaceType>,
    pub window_days: u32,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    pub source_fetch_delay_ms: u64,
    pub parallel_race_types: bool,
    pub sync_interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            race_types: config.race_types.clone(),
            window_days: config.window_days,
            batch_size: config.batch_size,
            batch_pause_ms: duration_ms(config.batch_pause),
            source_fetch_delay_ms: duration_ms(config.source_fetch_delay),
            parallel_race_types: config.parallel_race_types,
            sync_interval_secs: config.sync_interval.as_secs(),
        }
    }
}

impl SyncSettings {
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_race_types(self.race_types.iter().copied())
            .with_window_days(self.window_days)
            .with_batching(self.batch_size, Duration::from_millis(self.batch_pause_ms))
            .with_source_fetch_delay(Duration::from_millis(self.source_fetch_delay_ms))
            .with_parallel_race_types(self.parallel_race_types)
            .with_sync_interval(Duration::from_secs(self.sync_interval_secs))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one JSON file per race type.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// JSON file holding the calendar's events.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Directory of `{race_type}/{YYYYMMDD}.json` files.
    pub dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Loads the file at `path`, or the default file when `path` is `None`.
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("racecal")
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("racecal")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("storage"))
    }

    pub fn calendar_path(&self) -> PathBuf {
        self.calendar
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("calendar.json"))
    }

    pub fn source_dir(&self) -> PathBuf {
        self.source
            .dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("source"))
    }

    /// Builds the display grade lists.
    ///
    /// # Errors
    ///
    /// Fails on a key that is not a race type prefix.
    pub fn display_grades(&self) -> ClientResult<DisplayGrades> {
        self.display_grades
            .iter()
            .try_fold(DisplayGrades::new(), |grades, (key, list)| {
                let race_type: RaceType = key.parse().map_err(|e| {
                    ClientError::Config(format!("[display_grades] {}", e))
                })?;
                Ok(grades.with_grades(race_type, list.iter().cloned()))
            })
    }

    /// Checks every setting and returns warnings that are not errors.
    pub fn validate(&self) -> ClientResult<Vec<String>> {
        self.sync.to_sync_config().validate()?;
        let grades = self.display_grades()?;

        let mut warnings = Vec::new();
        for race_type in RaceType::ALL {
            if !self.display_grades.contains_key(race_type.prefix()) {
                continue;
            }
            let unknown = grades.unknown_grades(race_type);
            if !unknown.is_empty() {
                warnings.push(format!(
                    "[display_grades] {} lists unknown grades: {}",
                    race_type,
                    unknown.join(", ")
                ));
            }
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse {
        use super::*;

        #[test]
        fn empty_file_gives_defaults() {
            let config: ClientConfig = toml::from_str("").unwrap();
            assert!(!config.debug);
            assert_eq!(config.sync.race_types.len(), 6);
            assert_eq!(config.sync.batch_size, 25);
            assert_eq!(config.sync.to_sync_config(), SyncConfig::default());
        }

        #[test]
        fn sync_section_maps_to_sync_config() {
            let config: ClientConfig = toml::from_str(
                r#"
[sync]
race_types = ["keirin", "jra"]
window_days = 3
batch_size = 10
batch_pause_ms = 250
source_fetch_delay_ms = 2000
parallel_race_types = true
"#,
            )
            .unwrap();
            let sync = config.sync.to_sync_config();
            assert_eq!(sync.race_types, vec![RaceType::Keirin, RaceType::Jra]);
            assert_eq!(sync.window_days, 3);
            assert_eq!(sync.batch_size, 10);
            assert_eq!(sync.batch_pause, Duration::from_millis(250));
            assert_eq!(sync.source_fetch_delay, Duration::from_secs(2));
            assert!(sync.parallel_race_types);
            assert_eq!(sync.sync_interval, Duration::from_secs(3600));
        }

        #[test]
        fn unknown_race_type_is_a_parse_error() {
            let result: Result<ClientConfig, _> =
                toml::from_str("[sync]\nrace_types = [\"horse\"]\n");
            assert!(result.is_err());
        }

        #[test]
        fn paths_override_defaults() {
            let config: ClientConfig = toml::from_str(
                r#"
[storage]
dir = "/tmp/storage"

[calendar]
path = "/tmp/calendar.json"
"#,
            )
            .unwrap();
            assert_eq!(config.storage_dir(), PathBuf::from("/tmp/storage"));
            assert_eq!(config.calendar_path(), PathBuf::from("/tmp/calendar.json"));
            assert!(config.source_dir().ends_with("racecal/source"));
        }
    }

    mod display_grades {
        use super::*;

        #[test]
        fn overrides_by_prefix() {
            let config: ClientConfig =
                toml::from_str("[display_grades]\nkeirin = [\"GP\"]\n").unwrap();
            let grades = config.display_grades().unwrap();
            assert!(grades.contains(RaceType::Keirin, "GP"));
            assert!(!grades.contains(RaceType::Keirin, "GⅠ"));
            assert!(grades.contains(RaceType::Jra, "GⅠ"));
        }

        #[test]
        fn unknown_key_is_rejected() {
            let config: ClientConfig =
                toml::from_str("[display_grades]\nhorse = [\"GⅠ\"]\n").unwrap();
            assert!(matches!(config.display_grades(), Err(ClientError::Config(_))));
        }

        #[test]
        fn unknown_grades_are_warnings() {
            let config: ClientConfig =
                toml::from_str("[display_grades]\nkeirin = [\"GⅠ\", \"G1\"]\n").unwrap();
            let warnings = config.validate().unwrap();
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].contains("G1"));
        }
    }

    mod load {
        use super::*;

        #[test]
        fn explicit_missing_file_errors() {
            let dir = tempfile::tempdir().unwrap();
            let result = ClientConfig::load(Some(&dir.path().join("missing.toml")));
            assert!(matches!(result, Err(ClientError::Config(_))));
        }

        #[test]
        fn round_trips_through_toml() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.toml");
            let mut config = ClientConfig::default();
            config.sync.window_days = 7;
            config
                .display_grades
                .insert("nar".to_string(), vec!["GⅠ".to_string()]);
            std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

            let loaded = ClientConfig::load(Some(&path)).unwrap();
            assert_eq!(loaded.sync.window_days, 7);
            assert_eq!(loaded.display_grades["nar"], vec!["GⅠ"]);
        }

        #[test]
        fn invalid_settings_fail_validation() {
            let mut config = ClientConfig::default();
            config.sync.window_days = 0;
            assert!(matches!(config.validate(), Err(ClientError::Sync(_))));
        }
    }
}
