//! Configuration Vault – reads/writes `~/.artrack/config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use artrack_perception::config::{
    ArTrackConfig, DEFAULT_REFERENCE_FRAME, DEFAULT_TRANSFORM_TIMEOUT,
};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Persisted configuration stored in `~/.artrack/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Frame percept poses are expressed in.
    #[serde(default = "default_reference_frame")]
    pub reference_frame: String,

    /// Upper bound on a single transform lookup (milliseconds).
    #[serde(default = "default_transform_timeout_ms")]
    pub transform_timeout_ms: u64,

    /// Raw module options, applied the same way a host framework would pass
    /// them (e.g. `min_track_err = "0.15"`).
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

fn default_reference_frame() -> String {
    DEFAULT_REFERENCE_FRAME.to_string()
}
fn default_transform_timeout_ms() -> u64 {
    DEFAULT_TRANSFORM_TIMEOUT.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_frame: default_reference_frame(),
            transform_timeout_ms: default_transform_timeout_ms(),
            parameters: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Build the perception module settings.  Unknown or malformed
    /// `parameters` entries are logged and skipped.
    pub fn to_module_config(&self) -> ArTrackConfig {
        let mut cfg = ArTrackConfig {
            reference_frame: self.reference_frame.clone(),
            transform_timeout: Duration::from_millis(self.transform_timeout_ms),
            ..ArTrackConfig::default()
        };
        for (name, value) in &self.parameters {
            cfg.apply_parameter(name, value);
        }
        cfg
    }
}

/// Return the path to `~/.artrack/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".artrack").join("config.toml")
}

/// Load the config from a specific path.  Returns `None` if the file does not
/// exist.  Environment overrides are applied separately by
/// [`apply_env_overrides`].
pub fn load_from(path: &Path) -> Result<Option<Config>, CliError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Config = toml::from_str(&raw)?;
    Ok(Some(cfg))
}

/// Apply `ARTRACK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ARTRACK_REFERENCE_FRAME` | `reference_frame` |
/// | `ARTRACK_TRANSFORM_TIMEOUT_MS` | `transform_timeout_ms` |
/// | `ARTRACK_MIN_TRACK_ERR` | `parameters.min_track_err` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ARTRACK_REFERENCE_FRAME") {
        cfg.reference_frame = v;
    }
    if let Ok(v) = std::env::var("ARTRACK_TRANSFORM_TIMEOUT_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.transform_timeout_ms = ms;
    }
    if let Ok(v) = std::env::var("ARTRACK_MIN_TRACK_ERR") {
        cfg.parameters.insert("min_track_err".to_string(), v);
    }
}

/// Save the config to a specific path, creating parent directories.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CliError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let raw = toml::to_string_pretty(cfg)?;
    fs::write(path, raw).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.reference_frame, "map");
        assert_eq!(loaded.transform_timeout_ms, 1000);
        assert!(loaded.parameters.is_empty());
    }

    #[test]
    fn config_path_points_to_artrack_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".artrack"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let result = load_from(&dir.path().join("config.toml")).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn parameters_feed_module_config() {
        let cfg: Config = toml::from_str(
            r#"
            reference_frame = "odom"
            transform_timeout_ms = 250

            [parameters]
            min_track_err = "0.15"
            bogus_option = "1"
            "#,
        )
        .expect("parse");
        let module = cfg.to_module_config();
        assert_eq!(module.reference_frame, "odom");
        assert_eq!(module.transform_timeout, Duration::from_millis(250));
        assert!((module.min_track_err - 0.15).abs() < 1e-6);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "transform_timeout_ms = \"soon\"").expect("write");
        assert!(matches!(load_from(&path), Err(CliError::ConfigParse(_))));
    }

    #[test]
    fn apply_env_overrides_changes_fields() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe {
            std::env::set_var("ARTRACK_REFERENCE_FRAME", "world");
            std::env::set_var("ARTRACK_TRANSFORM_TIMEOUT_MS", "not-a-number");
            std::env::set_var("ARTRACK_MIN_TRACK_ERR", "0.1");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.reference_frame, "world");
        assert_eq!(cfg.transform_timeout_ms, 1000, "invalid values are ignored");
        assert_eq!(cfg.parameters.get("min_track_err").map(String::as_str), Some("0.1"));
        unsafe {
            std::env::remove_var("ARTRACK_REFERENCE_FRAME");
            std::env::remove_var("ARTRACK_TRANSFORM_TIMEOUT_MS");
            std::env::remove_var("ARTRACK_MIN_TRACK_ERR");
        }
    }
}
