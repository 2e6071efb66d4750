//! Phase durations and long-break cadence.
//!
//! `PhaseConfig` always holds a valid value: it starts from defaults and only
//! changes through [`PhaseConfig::merged`], which validates a whole
//! [`PhaseConfigUpdate`] before anything is applied.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FOCUS_SECONDS: u32 = 25 * 60;
pub const DEFAULT_SHORT_BREAK_SECONDS: u32 = 5 * 60;
pub const DEFAULT_LONG_BREAK_SECONDS: u32 = 15 * 60;
pub const DEFAULT_CYCLES_BEFORE_LONG_BREAK: u32 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be a positive integer, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("{field} is too large: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseConfig {
    pub focus_duration_seconds: u32,
    pub short_break_duration_seconds: u32,
    pub long_break_duration_seconds: u32,
    pub cycles_before_long_break: u32,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            focus_duration_seconds: DEFAULT_FOCUS_SECONDS,
            short_break_duration_seconds: DEFAULT_SHORT_BREAK_SECONDS,
            long_break_duration_seconds: DEFAULT_LONG_BREAK_SECONDS,
            cycles_before_long_break: DEFAULT_CYCLES_BEFORE_LONG_BREAK,
        }
    }
}

/// Partial or full configuration change. Absent fields keep their value.
///
/// Fields are signed so that zero and negative input reaches validation
/// instead of failing somewhere in deserialization.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_duration_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_duration_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_duration_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycles_before_long_break: Option<i64>,
}

impl PhaseConfigUpdate {
    /// Parses a JSON object; non-integer numbers are rejected here.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|err| ConfigError::Malformed(err.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.focus_duration_seconds.is_none()
            && self.short_break_duration_seconds.is_none()
            && self.long_break_duration_seconds.is_none()
            && self.cycles_before_long_break.is_none()
    }
}

impl From<PhaseConfig> for PhaseConfigUpdate {
    fn from(config: PhaseConfig) -> Self {
        Self {
            focus_duration_seconds: Some(config.focus_duration_seconds.into()),
            short_break_duration_seconds: Some(config.short_break_duration_seconds.into()),
            long_break_duration_seconds: Some(config.long_break_duration_seconds.into()),
            cycles_before_long_break: Some(config.cycles_before_long_break.into()),
        }
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    u32::try_from(value).map_err(|_| ConfigError::OutOfRange { field, value })
}

fn merge_field(
    field: &'static str,
    update: Option<i64>,
    current: u32,
) -> Result<u32, ConfigError> {
    match update {
        Some(value) => positive(field, value),
        None => Ok(current),
    }
}

impl PhaseConfig {
    /// Returns the configuration with `update` applied, or the first invalid
    /// field. `self` is never modified.
    pub fn merged(&self, update: &PhaseConfigUpdate) -> Result<PhaseConfig, ConfigError> {
        Ok(PhaseConfig {
            focus_duration_seconds: merge_field(
                "focusDurationSeconds",
                update.focus_duration_seconds,
                self.focus_duration_seconds,
            )?,
            short_break_duration_seconds: merge_field(
                "shortBreakDurationSeconds",
                update.short_break_duration_seconds,
                self.short_break_duration_seconds,
            )?,
            long_break_duration_seconds: merge_field(
                "longBreakDurationSeconds",
                update.long_break_duration_seconds,
                self.long_break_duration_seconds,
            )?,
            cycles_before_long_break: merge_field(
                "cyclesBeforeLongBreak",
                update.cycles_before_long_break,
                self.cycles_before_long_break,
            )?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        PhaseConfig::default()
            .merged(&PhaseConfigUpdate::from(*self))
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PhaseConfig::default();
        assert_eq!(config.focus_duration_seconds, 1500);
        assert_eq!(config.short_break_duration_seconds, 300);
        assert_eq!(config.long_break_duration_seconds, 900);
        assert_eq!(config.cycles_before_long_break, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let config = PhaseConfig::default();
        let update = PhaseConfigUpdate {
            short_break_duration_seconds: Some(120),
            ..Default::default()
        };

        let merged = config.merged(&update).unwrap();

        assert_eq!(merged.short_break_duration_seconds, 120);
        assert_eq!(merged.focus_duration_seconds, 1500);
        assert_eq!(merged.cycles_before_long_break, 4);
    }

    #[test]
    fn test_update_with_one_bad_field_is_rejected_whole() {
        let config = PhaseConfig::default();
        let update = PhaseConfigUpdate {
            focus_duration_seconds: Some(600),
            cycles_before_long_break: Some(0),
            ..Default::default()
        };

        let err = config.merged(&update).unwrap_err();

        assert_eq!(
            err,
            ConfigError::NotPositive {
                field: "cyclesBeforeLongBreak",
                value: 0
            }
        );
        assert_eq!(config, PhaseConfig::default());
    }

    #[test]
    fn test_negative_and_oversized_values() {
        let config = PhaseConfig::default();
        let negative = PhaseConfigUpdate {
            long_break_duration_seconds: Some(-5),
            ..Default::default()
        };
        assert!(matches!(
            config.merged(&negative),
            Err(ConfigError::NotPositive { .. })
        ));

        let huge = PhaseConfigUpdate {
            focus_duration_seconds: Some(i64::from(u32::MAX) + 1),
            ..Default::default()
        };
        assert!(matches!(
            config.merged(&huge),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_fractional_values() {
        let err = PhaseConfigUpdate::from_json(r#"{"focusDurationSeconds": 25.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));

        let ok = PhaseConfigUpdate::from_json(r#"{"focusDurationSeconds": 900}"#).unwrap();
        assert_eq!(ok.focus_duration_seconds, Some(900));
        assert!(ok.short_break_duration_seconds.is_none());
    }

    #[test]
    fn test_config_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(PhaseConfig::default()).unwrap();
        assert_eq!(json["focusDurationSeconds"], 1500);
        assert_eq!(json["shortBreakDurationSeconds"], 300);
        assert_eq!(json["longBreakDurationSeconds"], 900);
        assert_eq!(json["cyclesBeforeLongBreak"], 4);
    }
}
