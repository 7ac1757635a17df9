// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for GitGov Core.
//!
//! This crate provides [`GitGovConfig`] — the settings a caller assembling
//! the [`gitgov`](../gitgov/index.html) facade needs: the health thresholds
//! `BacklogAdapter`/`MetricsAdapter` are constructed with, and which
//! workflow methodology to load. Mirrors the shape of the teacher
//! workspace's own config crate: a validator over a config struct producing
//! advisory [`ConfigWarning`]s, plus TOML load/merge helpers.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use gitgov_metrics::HealthThresholds;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },
    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },
    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

impl ConfigError {
    /// Stable error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::ParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::ValidationError { .. } => "CONFIG_VALIDATION_ERROR",
        }
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// `task_min_score` and `system_min_score` disagree enough that a task
    /// could be individually healthy while the system reads unhealthy, or
    /// vice versa.
    InconsistentThresholds {
        /// `health_thresholds.task_min_score`.
        task_min_score: f64,
        /// `health_thresholds.system_min_score`.
        system_min_score: f64,
    },
    /// `max_days_in_stage` is unusually low, which will flag most
    /// in-progress work as stale.
    TightStageWindow {
        /// The configured window, in days.
        days: f64,
    },
    /// `methodology_source` names a file path that does not exist on disk
    /// at validation time (the loader will fail later if this doesn't
    /// change before load).
    MethodologyFileMissing {
        /// The configured path.
        path: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::InconsistentThresholds { task_min_score, system_min_score } => write!(
                f,
                "task_min_score ({task_min_score}) and system_min_score ({system_min_score}) differ by more than 30 points"
            ),
            ConfigWarning::TightStageWindow { days } => {
                write!(f, "max_days_in_stage ({days}) is under 1 day; most active tasks will read as stale")
            }
            ConfigWarning::MethodologyFileMissing { path } => {
                write!(f, "methodology file '{path}' does not exist")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Which workflow methodology document to load.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MethodologySource {
    /// A methodology bundled with `gitgov-workflow` (`"kanban"` or
    /// `"scrum"`).
    Bundled {
        /// The bundled methodology's name.
        name: String,
    },
    /// A user-supplied methodology document on disk.
    File {
        /// Path to the JSON document.
        path: String,
    },
}

impl Default for MethodologySource {
    fn default() -> Self {
        MethodologySource::Bundled { name: "kanban".into() }
    }
}

/// Top-level runtime configuration for GitGov Core.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct GitGovConfig {
    /// Forwarded to `BacklogAdapter`/`MetricsAdapter` for health
    /// classification.
    #[serde(default)]
    pub health_thresholds: HealthThresholds,
    /// Which methodology document `WorkflowMethodology` should load.
    #[serde(default)]
    pub methodology_source: MethodologySource,
    /// Root directory of the `.gitgov/` record store. `None` defaults to
    /// `./.gitgov` at wiring time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_root: Option<String>,
    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for GitGovConfig {
    fn default() -> Self {
        Self {
            health_thresholds: HealthThresholds::default(),
            methodology_source: MethodologySource::default(),
            store_root: None,
            log_level: Some("info".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const THRESHOLD_DISAGREEMENT: f64 = 30.0;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`GitGovConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`GitGovConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<GitGovConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .map_err(|_| ConfigError::FileNotFound { path: p.display().to_string() })?;
            parse_toml(&content)?
        }
        None => GitGovConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`GitGovConfig`].
pub fn parse_toml(content: &str) -> Result<GitGovConfig, ConfigError> {
    toml::from_str::<GitGovConfig>(content).map_err(|e| ConfigError::ParseError { reason: e.to_string() })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `GITGOV_STORE_ROOT`
/// - `GITGOV_LOG_LEVEL`
pub fn apply_env_overrides(config: &mut GitGovConfig) {
    if let Ok(val) = std::env::var("GITGOV_STORE_ROOT") {
        config.store_root = Some(val);
    }
    if let Ok(val) = std::env::var("GITGOV_LOG_LEVEL") {
        config.log_level = Some(val);
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (out-of-range thresholds, unknown log level, empty bundled
/// methodology name) are returned as a [`ConfigError::ValidationError`];
/// soft issues come back as warnings.
pub fn validate_config(config: &GitGovConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    let t = &config.health_thresholds;
    for (name, value) in [
        ("task_min_score", t.task_min_score),
        ("system_min_score", t.system_min_score),
    ] {
        if !(0.0..=100.0).contains(&value) {
            errors.push(format!("{name} ({value}) must be between 0 and 100"));
        }
    }
    if t.max_days_in_stage <= 0.0 {
        errors.push(format!("max_days_in_stage ({}) must be positive", t.max_days_in_stage));
    } else if t.max_days_in_stage < 1.0 {
        warnings.push(ConfigWarning::TightStageWindow { days: t.max_days_in_stage });
    }
    if (t.task_min_score - t.system_min_score).abs() > THRESHOLD_DISAGREEMENT {
        warnings.push(ConfigWarning::InconsistentThresholds {
            task_min_score: t.task_min_score,
            system_min_score: t.system_min_score,
        });
    }

    match &config.methodology_source {
        MethodologySource::Bundled { name } => {
            if name != "kanban" && name != "scrum" {
                errors.push(format!("unknown bundled methodology '{name}' (expected 'kanban' or 'scrum')"));
            }
        }
        MethodologySource::File { path } => {
            if path.trim().is_empty() {
                errors.push("methodology file path must not be empty".into());
            } else if !Path::new(path).exists() {
                warnings.push(ConfigWarning::MethodologyFileMissing { path: path.clone() });
            }
        }
    }

    if let Some(ref level) = config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over `base`.
#[must_use]
pub fn merge_configs(base: GitGovConfig, overlay: GitGovConfig) -> GitGovConfig {
    GitGovConfig {
        health_thresholds: overlay.health_thresholds,
        methodology_source: overlay.methodology_source,
        store_root: overlay.store_root.or(base.store_root),
        log_level: overlay.log_level.or(base.log_level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = GitGovConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(warnings.is_empty());
    }

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = GitGovConfig::default();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        assert_eq!(cfg.methodology_source, MethodologySource::Bundled { name: "kanban".into() });
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml_str = r#"
            log_level = "debug"

            [health_thresholds]
            task_min_score = 60.0
            max_days_in_stage = 5.0
            system_min_score = 60.0

            [methodology_source]
            type = "bundled"
            name = "scrum"
        "#;
        let cfg = parse_toml(toml_str).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.methodology_source, MethodologySource::Bundled { name: "scrum".into() });
        assert_eq!(cfg.health_thresholds.task_min_score, 60.0);
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let bad = "this is [not valid toml =";
        let err = parse_toml(bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_catches_invalid_log_level() {
        let cfg = GitGovConfig { log_level: Some("verbose".into()), ..Default::default() };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_out_of_range_threshold() {
        let mut cfg = GitGovConfig::default();
        cfg.health_thresholds.task_min_score = 150.0;
        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("task_min_score")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn validation_catches_non_positive_stage_window() {
        let mut cfg = GitGovConfig::default();
        cfg.health_thresholds.max_days_in_stage = 0.0;
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn tight_stage_window_produces_warning() {
        let mut cfg = GitGovConfig::default();
        cfg.health_thresholds.max_days_in_stage = 0.5;
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::TightStageWindow { .. })));
    }

    #[test]
    fn inconsistent_thresholds_produces_warning() {
        let mut cfg = GitGovConfig::default();
        cfg.health_thresholds.task_min_score = 90.0;
        cfg.health_thresholds.system_min_score = 10.0;
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::InconsistentThresholds { .. })));
    }

    #[test]
    fn unknown_bundled_methodology_is_rejected() {
        let cfg = GitGovConfig { methodology_source: MethodologySource::Bundled { name: "xp".into() }, ..Default::default() };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn missing_methodology_file_produces_warning_not_error() {
        let cfg = GitGovConfig {
            methodology_source: MethodologySource::File { path: "/nonexistent/methodology.json".into() },
            ..Default::default()
        };
        let warnings = validate_config(&cfg).expect("missing file is advisory, not fatal");
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::MethodologyFileMissing { .. })));
    }

    #[test]
    fn merge_overlay_overrides_base() {
        let base = GitGovConfig { log_level: Some("info".into()), ..Default::default() };
        let overlay = GitGovConfig { log_level: Some("debug".into()), ..Default::default() };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn merge_preserves_base_store_root_when_overlay_has_none() {
        let base = GitGovConfig { store_root: Some("/repo/.gitgov".into()), ..Default::default() };
        let overlay = GitGovConfig::default();
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.store_root.as_deref(), Some("/repo/.gitgov"));
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = GitGovConfig {
            store_root: Some("/ws/.gitgov".into()),
            log_level: Some("debug".into()),
            ..Default::default()
        };
        let serialized = toml::to_string(&cfg).unwrap();
        let deserialized: GitGovConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(cfg, deserialized);
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitgov.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "log_level = \"warn\"").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/gitgov.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn load_none_returns_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::FileNotFound { path: "/foo".into() };
        assert!(e.to_string().contains("/foo"));
    }

    #[test]
    fn config_warning_display() {
        let w = ConfigWarning::TightStageWindow { days: 0.2 };
        assert!(w.to_string().contains("0.2"));
    }
}
