use std::fmt;

use crate::tier::QualityTier;

/// Fatal configuration problems. The control loop cannot operate on a
/// broken tier table or inverted thresholds, so these fail at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ReadConfigFile { path: String, message: String },
    ParseConfigFile { path: String, message: String },
    InvalidEnvVar { name: String, message: String },
    EmptyTierTable,
    InvalidRenderScale { tier: QualityTier, scale: f64 },
    ZeroPhysicsIterations { tier: QualityTier },
    UndefinedInitialTier { tier: QualityTier },
    NonPositiveTargetFps { target_fps: f64 },
    RatioOutOfRange { name: String, value: f64 },
    InvertedThresholds { warning_ratio: f64, critical_ratio: f64 },
    ZeroConsecutiveCycles,
    ZeroSampleInterval,
    ZeroEvaluationCadence,
    ZeroRollingWindow,
    ZeroJournalCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadConfigFile { path, message } => {
                write!(f, "failed to read config file {}: {}", path, message)
            }
            ConfigError::ParseConfigFile { path, message } => {
                write!(f, "failed to parse config file {}: {}", path, message)
            }
            ConfigError::InvalidEnvVar { name, message } => {
                write!(f, "invalid environment variable {}: {}", name, message)
            }
            ConfigError::EmptyTierTable => write!(f, "tier table is empty"),
            ConfigError::InvalidRenderScale { tier, scale } => {
                write!(f, "tier {} has invalid render scale {}", tier.as_str(), scale)
            }
            ConfigError::ZeroPhysicsIterations { tier } => {
                write!(f, "tier {} has zero physics solver iterations", tier.as_str())
            }
            ConfigError::UndefinedInitialTier { tier } => {
                write!(f, "initial tier {} is not in the tier table", tier.as_str())
            }
            ConfigError::NonPositiveTargetFps { target_fps } => {
                write!(f, "target frame rate must be positive, got {}", target_fps)
            }
            ConfigError::RatioOutOfRange { name, value } => {
                write!(f, "{} must be in (0, 1), got {}", name, value)
            }
            ConfigError::InvertedThresholds {
                warning_ratio,
                critical_ratio,
            } => write!(
                f,
                "critical ratio {} must be below warning ratio {}",
                critical_ratio, warning_ratio
            ),
            ConfigError::ZeroConsecutiveCycles => {
                write!(f, "consecutive evaluation cycles must be at least 1")
            }
            ConfigError::ZeroSampleInterval => write!(f, "sample interval must be at least 1 ms"),
            ConfigError::ZeroEvaluationCadence => {
                write!(f, "evaluation cadence must be at least 1 tick")
            }
            ConfigError::ZeroRollingWindow => write!(f, "rolling window must hold at least 1 sample"),
            ConfigError::ZeroJournalCapacity => {
                write!(f, "journal capacity must be at least 1 event")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A dependent subsystem rejected a settings push. Always recovered
/// locally: the applier skips the subsystem, journals the skip, and
/// continues with the rest of the tier application.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyError {
    OutOfRange { knob: String, value: f64, limit: f64 },
    Unavailable { reason: String },
    Rejected { reason: String },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::OutOfRange { knob, value, limit } => {
                write!(f, "{} value {} exceeds limit {}", knob, value, limit)
            }
            ApplyError::Unavailable { reason } => write!(f, "subsystem unavailable: {}", reason),
            ApplyError::Rejected { reason } => write!(f, "setting rejected: {}", reason),
        }
    }
}

impl std::error::Error for ApplyError {}
