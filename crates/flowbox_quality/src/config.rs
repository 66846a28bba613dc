//! Controller configuration: TOML file with environment fallback.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::evaluator::EvaluatorConfig;
use crate::events::DEFAULT_JOURNAL_CAPACITY;
use crate::sampler::DEFAULT_SAMPLE_WINDOW;
use crate::tier::{QualityTier, TierTable};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "quality.toml";

pub const ENV_TARGET_FPS: &str = "FLOWBOX_TARGET_FPS";
pub const ENV_WARNING_RATIO: &str = "FLOWBOX_WARNING_RATIO";
pub const ENV_CRITICAL_RATIO: &str = "FLOWBOX_CRITICAL_RATIO";
pub const ENV_CONSECUTIVE_CYCLES: &str = "FLOWBOX_CONSECUTIVE_CYCLES";
pub const ENV_COOLDOWN_CYCLES: &str = "FLOWBOX_COOLDOWN_CYCLES";
pub const ENV_SAMPLE_INTERVAL_MS: &str = "FLOWBOX_SAMPLE_INTERVAL_MS";
pub const ENV_INITIAL_TIER: &str = "FLOWBOX_INITIAL_TIER";

pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_EVALUATE_EVERY_TICKS: u64 = 1;
pub const DEFAULT_ROLLING_WINDOW: usize = 3;

/// Everything the controller needs at startup. Validation is fatal:
/// the control loop refuses to start on a broken table or inverted
/// thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Interval between samples, in milliseconds.
    pub sample_interval_ms: u64,
    /// Evaluate once every this many ticks (1 = every sample).
    pub evaluate_every_ticks: u64,
    /// Samples averaged per evaluation cycle.
    pub rolling_window: usize,
    /// Ring capacity of the sampler window.
    pub sample_window_capacity: usize,
    pub journal_capacity: usize,
    /// Starting tier; defaults to the highest tier in the table.
    pub initial_tier: Option<QualityTier>,
    pub evaluator: EvaluatorConfig,
    pub tiers: TierTable,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            evaluate_every_ticks: DEFAULT_EVALUATE_EVERY_TICKS,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            sample_window_capacity: DEFAULT_SAMPLE_WINDOW,
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            initial_tier: None,
            evaluator: EvaluatorConfig::default(),
            tiers: TierTable::default(),
        }
    }
}

impl ControllerConfig {
    /// Config file if present, environment otherwise.
    pub fn from_default_sources() -> Result<Self, ConfigError> {
        let config_path = Path::new(DEFAULT_CONFIG_FILE_NAME);
        if config_path.exists() {
            return Self::from_config_file(config_path);
        }
        Self::from_env()
    }

    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::ReadConfigFile {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let config = Self::from_toml_str(&content, &path.display().to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::ParseConfigFile {
            path: origin.to_string(),
            message: err.to_string(),
        })
    }

    /// Defaults overridden by `FLOWBOX_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = read_env_f64(ENV_TARGET_FPS)? {
            config.evaluator.target_fps = value;
        }
        if let Some(value) = read_env_f64(ENV_WARNING_RATIO)? {
            config.evaluator.warning_ratio = value;
        }
        if let Some(value) = read_env_f64(ENV_CRITICAL_RATIO)? {
            config.evaluator.critical_ratio = value;
        }
        if let Some(value) = read_env_u64(ENV_CONSECUTIVE_CYCLES)? {
            config.evaluator.consecutive_cycles = value as u32;
        }
        if let Some(value) = read_env_u64(ENV_COOLDOWN_CYCLES)? {
            config.evaluator.cooldown_cycles = value as u32;
        }
        if let Some(value) = read_env_u64(ENV_SAMPLE_INTERVAL_MS)? {
            config.sample_interval_ms = value;
        }
        if let Some(raw) = read_env_raw(ENV_INITIAL_TIER) {
            let tier = parse_tier(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
                name: ENV_INITIAL_TIER.to_string(),
                message: format!("unknown tier: {}", raw),
            })?;
            config.initial_tier = Some(tier);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.evaluate_every_ticks == 0 {
            return Err(ConfigError::ZeroEvaluationCadence);
        }
        if self.rolling_window == 0 || self.sample_window_capacity == 0 {
            return Err(ConfigError::ZeroRollingWindow);
        }
        if self.journal_capacity == 0 {
            return Err(ConfigError::ZeroJournalCapacity);
        }
        self.evaluator.validate()?;
        self.tiers.validate()?;
        if let Some(tier) = self.initial_tier {
            if !self.tiers.contains(tier) {
                return Err(ConfigError::UndefinedInitialTier { tier });
            }
        }
        Ok(())
    }

    /// Starting tier: explicit, or the highest tier the table defines.
    /// `validate` guarantees the table is non-empty.
    pub fn resolved_initial_tier(&self) -> Option<QualityTier> {
        self.initial_tier.or_else(|| self.tiers.highest())
    }

    /// Per-frame time budget derived from the target frame rate.
    pub fn frame_budget_ms(&self) -> f64 {
        1000.0 / self.evaluator.target_fps
    }
}

fn read_env_raw(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn read_env_f64(name: &str) -> Result<Option<f64>, ConfigError> {
    match read_env_raw(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|err| ConfigError::InvalidEnvVar {
                name: name.to_string(),
                message: err.to_string(),
            }),
    }
}

fn read_env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
    match read_env_raw(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|err| ConfigError::InvalidEnvVar {
                name: name.to_string(),
                message: err.to_string(),
            }),
    }
}

fn parse_tier(raw: &str) -> Option<QualityTier> {
    QualityTier::ALL
        .into_iter()
        .find(|tier| tier.as_str() == raw.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolved_initial_tier(), Some(QualityTier::Ultra));
        assert!((config.frame_budget_ms() - 1000.0 / 90.0).abs() < 1e-9);
    }

    #[test]
    fn toml_overrides_defaults() {
        let content = r#"
            sample_interval_ms = 500
            rolling_window = 5

            [evaluator]
            target_fps = 72.0
            warning_ratio = 0.85
            critical_ratio = 0.5
        "#;
        let config = ControllerConfig::from_toml_str(content, "inline").unwrap();
        assert_eq!(config.sample_interval_ms, 500);
        assert_eq!(config.rolling_window, 5);
        assert_eq!(config.evaluator.target_fps, 72.0);
        assert_eq!(config.evaluator.warning_ratio, 0.85);
        // Untouched fields keep their defaults.
        assert_eq!(config.evaluate_every_ticks, DEFAULT_EVALUATE_EVERY_TICKS);
        assert_eq!(config.tiers.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_tier_table_replaces_the_default() {
        let content = r#"
            initial_tier = "high"

            [tiers.low]
            render_scale = 0.6
            max_targets = 10

            [tiers.high]
            render_scale = 1.1
            max_targets = 30
        "#;
        let config = ControllerConfig::from_toml_str(content, "inline").unwrap();
        assert_eq!(config.tiers.len(), 2);
        assert_eq!(config.initial_tier, Some(QualityTier::High));
        assert_eq!(
            config.tiers.get(QualityTier::Low).unwrap().max_targets,
            10
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = ControllerConfig::from_toml_str("sample_interval_ms = \"soon\"", "inline")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseConfigFile { .. }));
    }

    #[test]
    fn initial_tier_must_exist_in_the_table() {
        let content = r#"
            initial_tier = "ultra"

            [tiers.low]
            [tiers.high]
        "#;
        let config = ControllerConfig::from_toml_str(content, "inline").unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::UndefinedInitialTier {
                tier: QualityTier::Ultra
            })
        );
    }

    #[test]
    fn env_overrides_apply_and_validate() {
        env::set_var(ENV_TARGET_FPS, "120");
        env::set_var(ENV_INITIAL_TIER, "medium");
        let config = ControllerConfig::from_env().unwrap();
        env::remove_var(ENV_TARGET_FPS);
        env::remove_var(ENV_INITIAL_TIER);
        assert_eq!(config.evaluator.target_fps, 120.0);
        assert_eq!(config.initial_tier, Some(QualityTier::Medium));
    }

    #[test]
    fn zero_cadence_fails_validation() {
        let config = ControllerConfig {
            evaluate_every_ticks: 0,
            ..ControllerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroEvaluationCadence));
    }
}
