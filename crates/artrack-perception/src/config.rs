//! Typed configuration of the AR-tag perception module.
//!
//! Host frameworks pass module options as `(name, value)` string pairs.
//! [`Parameter::parse`] turns such a pair into a typed option and
//! [`ArTrackConfig::apply_parameter`] applies it; unknown names and
//! unparsable values are logged as warnings and leave the config unchanged.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Default tracking-error threshold (metres of marker shift).
pub const DEFAULT_MIN_TRACK_ERR: f32 = 0.20;

/// Default frame percept poses are expressed in.
pub const DEFAULT_REFERENCE_FRAME: &str = "map";

/// Default upper bound on a single transform lookup.
pub const DEFAULT_TRANSFORM_TIMEOUT: Duration = Duration::from_secs(1);

/// A recognised runtime option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    /// `min_track_err`: observations with a confidence at or above this value
    /// are rejected.
    MinTrackErr(f32),
}

/// Why a `(name, value)` pair could not be turned into a [`Parameter`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Unknown parameter {0}")]
    Unknown(String),
    #[error("Invalid value \"{value}\" for parameter {name}")]
    InvalidValue { name: String, value: String },
}

impl Parameter {
    pub fn parse(name: &str, value: &str) -> Result<Self, ParameterError> {
        match name {
            "min_track_err" => value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Parameter::MinTrackErr)
                .ok_or_else(|| ParameterError::InvalidValue {
                    name: name.to_string(),
                    value: value.to_string(),
                }),
            _ => Err(ParameterError::Unknown(name.to_string())),
        }
    }
}

/// Settings of [`ArTrackPerception`][crate::artrack::ArTrackPerception].
#[derive(Debug, Clone, PartialEq)]
pub struct ArTrackConfig {
    /// Strict upper bound on an observation's confidence (lower is better).
    pub min_track_err: f32,
    /// Frame percept poses are expressed in.
    pub reference_frame: String,
    /// Timeout handed to every transform lookup.
    pub transform_timeout: Duration,
}

impl Default for ArTrackConfig {
    fn default() -> Self {
        Self {
            min_track_err: DEFAULT_MIN_TRACK_ERR,
            reference_frame: DEFAULT_REFERENCE_FRAME.to_string(),
            transform_timeout: DEFAULT_TRANSFORM_TIMEOUT,
        }
    }
}

impl ArTrackConfig {
    pub fn set(&mut self, parameter: Parameter) {
        match parameter {
            Parameter::MinTrackErr(v) => self.min_track_err = v,
        }
    }

    /// Apply a string-keyed option.  Returns whether the config changed;
    /// failures are logged, never propagated.
    pub fn apply_parameter(&mut self, name: &str, value: &str) -> bool {
        match Parameter::parse(name, value) {
            Ok(parameter) => {
                self.set(parameter);
                true
            }
            Err(e) => {
                warn!(parameter = name, value, error = %e, "ignoring module parameter");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_module_contract() {
        let cfg = ArTrackConfig::default();
        assert!((cfg.min_track_err - 0.20).abs() < 1e-6);
        assert_eq!(cfg.reference_frame, "map");
        assert_eq!(cfg.transform_timeout, Duration::from_secs(1));
    }

    #[test]
    fn min_track_err_is_parsed() {
        assert_eq!(
            Parameter::parse("min_track_err", " 0.15 "),
            Ok(Parameter::MinTrackErr(0.15))
        );
        let mut cfg = ArTrackConfig::default();
        assert!(cfg.apply_parameter("min_track_err", "0.3"));
        assert!((cfg.min_track_err - 0.3).abs() < 1e-6);
    }

    #[test]
    fn unknown_parameter_is_ignored() {
        let mut cfg = ArTrackConfig::default();
        assert_eq!(
            Parameter::parse("max_track_err", "1.0"),
            Err(ParameterError::Unknown("max_track_err".into()))
        );
        assert!(!cfg.apply_parameter("max_track_err", "1.0"));
        assert_eq!(cfg, ArTrackConfig::default());
    }

    #[test]
    fn malformed_value_is_ignored() {
        let mut cfg = ArTrackConfig::default();
        assert!(matches!(
            Parameter::parse("min_track_err", "twenty cm"),
            Err(ParameterError::InvalidValue { .. })
        ));
        assert!(!cfg.apply_parameter("min_track_err", "NaN"));
        assert!((cfg.min_track_err - DEFAULT_MIN_TRACK_ERR).abs() < 1e-6);
    }
}
