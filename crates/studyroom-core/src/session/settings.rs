//! TOML-based session settings.
//!
//! Stores the interval configuration a session is generated from:
//! - Study / short break / long break durations
//! - Long break cadence
//! - Sound and auto-start preferences
//!
//! Settings are stored at `~/.config/studyroom/settings.toml` and are
//! immutable for a session once its cycles have been generated.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, ValidationError};
use crate::storage::data_dir;

/// Session settings.
///
/// Serialized to/from TOML at `~/.config/studyroom/settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Study cycle length in minutes.
    #[serde(default = "default_study_minutes")]
    pub study_minutes: u64,
    /// Short break length in minutes.
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u64,
    /// Long break length in minutes.
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u64,
    /// A long break is inserted after every N-th study cycle.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u64,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Playback volume, 0.0 to 1.0.
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Start break countdowns without waiting for user action.
    #[serde(default)]
    pub auto_start_breaks: bool,
    /// Start the next study countdown without waiting for user action.
    #[serde(default)]
    pub auto_start_next: bool,
}

fn default_study_minutes() -> u64 {
    25
}
fn default_short_break_minutes() -> u64 {
    5
}
fn default_long_break_minutes() -> u64 {
    15
}
fn default_long_break_interval() -> u64 {
    4
}
fn default_true() -> bool {
    true
}
fn default_volume() -> f64 {
    0.5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            study_minutes: default_study_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_interval: default_long_break_interval(),
            sound_enabled: true,
            volume: default_volume(),
            auto_start_breaks: false,
            auto_start_next: false,
        }
    }
}

impl Settings {
    fn path() -> Result<PathBuf, std::io::Error> {
        Ok(data_dir()?.join("settings.toml"))
    }

    /// Load from disk or return defaults.
    ///
    /// A malformed file is logged and replaced with defaults rather than
    /// failing: settings are non-critical and the caller needs a usable
    /// value either way.
    ///
    /// # Errors
    ///
    /// Returns an error only if the data directory cannot be created or
    /// the default settings cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("settings.toml"),
            message: e.to_string(),
        })?;
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(settings) => Ok(settings),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "malformed settings file, using defaults");
                    Ok(Self::default())
                }
            },
            Err(_) => {
                let settings = Self::default();
                settings.save()?;
                Ok(settings)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::from("settings.toml"),
            message: e.to_string(),
        })?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Validate invariants: all minute values > 0, interval >= 1,
    /// volume within 0.0..=1.0.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.study_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "study_minutes".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.short_break_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "short_break_minutes".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.long_break_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "long_break_minutes".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.long_break_interval == 0 {
            return Err(ValidationError::InvalidValue {
                field: "long_break_interval".into(),
                message: "must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ValidationError::InvalidValue {
                field: "volume".into(),
                message: "must be between 0.0 and 1.0".into(),
            });
        }
        Ok(())
    }

    /// Get a settings value as a string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "study_minutes" => Some(self.study_minutes.to_string()),
            "short_break_minutes" => Some(self.short_break_minutes.to_string()),
            "long_break_minutes" => Some(self.long_break_minutes.to_string()),
            "long_break_interval" => Some(self.long_break_interval.to_string()),
            "sound_enabled" => Some(self.sound_enabled.to_string()),
            "volume" => Some(self.volume.to_string()),
            "auto_start_breaks" => Some(self.auto_start_breaks.to_string()),
            "auto_start_next" => Some(self.auto_start_next.to_string()),
            _ => None,
        }
    }

    /// Set a settings value by key. The new value is validated before
    /// it is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse,
    /// or the resulting settings fail validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), crate::error::CoreError> {
        let parse_u64 = |v: &str| -> Result<u64, ConfigError> {
            v.parse().map_err(|_| ConfigError::ParseFailed {
                key: key.into(),
                value: v.into(),
            })
        };
        let parse_bool = |v: &str| -> Result<bool, ConfigError> {
            v.parse().map_err(|_| ConfigError::ParseFailed {
                key: key.into(),
                value: v.into(),
            })
        };

        let mut updated = self.clone();
        match key {
            "study_minutes" => updated.study_minutes = parse_u64(value)?,
            "short_break_minutes" => updated.short_break_minutes = parse_u64(value)?,
            "long_break_minutes" => updated.long_break_minutes = parse_u64(value)?,
            "long_break_interval" => updated.long_break_interval = parse_u64(value)?,
            "sound_enabled" => updated.sound_enabled = parse_bool(value)?,
            "volume" => {
                updated.volume = value.parse().map_err(|_| ConfigError::ParseFailed {
                    key: key.into(),
                    value: value.into(),
                })?
            }
            "auto_start_breaks" => updated.auto_start_breaks = parse_bool(value)?,
            "auto_start_next" => updated.auto_start_next = parse_bool(value)?,
            _ => return Err(ConfigError::UnknownKey(key.into()).into()),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.study_minutes, 25);
        assert_eq!(s.short_break_minutes, 5);
        assert_eq!(s.long_break_minutes, 15);
        assert_eq!(s.long_break_interval, 4);
    }

    #[test]
    fn zero_minutes_rejected() {
        let s = Settings {
            study_minutes: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn volume_out_of_range_rejected() {
        let s = Settings {
            volume: 1.5,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn set_rejects_invalid_value() {
        let mut s = Settings::default();
        assert!(s.set("study_minutes", "0").is_err());
        assert!(s.set("study_minutes", "30").is_ok());
        assert_eq!(s.study_minutes, 30);
        // Failed set must leave settings untouched.
        assert!(s.set("volume", "2.0").is_err());
        assert_eq!(s.volume, 0.5);
    }

    #[test]
    fn get_unknown_key_is_none() {
        let s = Settings::default();
        assert!(s.get("theme").is_none());
        assert_eq!(s.get("long_break_interval").unwrap(), "4");
    }
}
