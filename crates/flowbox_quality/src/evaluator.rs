//! State evaluator: decides tier transitions from rolling frame rate.
//!
//! Policy: a critical frame rate steps down one tier immediately; a
//! sustained warning frame rate steps down one tier after N consecutive
//! cycles; a sustained at-target frame rate steps up one tier after N
//! consecutive cycles. Every transition arms a cooldown during which
//! the decision is always `Hold`. Down-steps never jump more than one
//! tier, no matter how low the frame rate goes.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TARGET_FPS: f64 = 90.0;
pub const DEFAULT_WARNING_RATIO: f64 = 0.8;
pub const DEFAULT_CRITICAL_RATIO: f64 = 0.6;
pub const DEFAULT_CONSECUTIVE_CYCLES: u32 = 3;
pub const DEFAULT_COOLDOWN_CYCLES: u32 = 2;

/// Thresholds and hysteresis settings for the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub target_fps: f64,
    /// Frame rates below `warning_ratio * target_fps` count toward a
    /// sustained-warning step-down.
    pub warning_ratio: f64,
    /// Frame rates below `critical_ratio * target_fps` step down
    /// immediately.
    pub critical_ratio: f64,
    /// Consecutive cycles required for a sustained-warning step-down or
    /// an at-target step-up.
    pub consecutive_cycles: u32,
    /// Evaluation cycles after a transition during which no further
    /// transition may occur.
    pub cooldown_cycles: u32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            warning_ratio: DEFAULT_WARNING_RATIO,
            critical_ratio: DEFAULT_CRITICAL_RATIO,
            consecutive_cycles: DEFAULT_CONSECUTIVE_CYCLES,
            cooldown_cycles: DEFAULT_COOLDOWN_CYCLES,
        }
    }
}

impl EvaluatorConfig {
    pub fn warning_fps(&self) -> f64 {
        self.target_fps * self.warning_ratio
    }

    pub fn critical_fps(&self) -> f64 {
        self.target_fps * self.critical_ratio
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_fps.is_finite() || self.target_fps <= 0.0 {
            return Err(ConfigError::NonPositiveTargetFps {
                target_fps: self.target_fps,
            });
        }
        for (name, value) in [
            ("warning_ratio", self.warning_ratio),
            ("critical_ratio", self.critical_ratio),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(ConfigError::RatioOutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        if self.critical_ratio >= self.warning_ratio {
            return Err(ConfigError::InvertedThresholds {
                warning_ratio: self.warning_ratio,
                critical_ratio: self.critical_ratio,
            });
        }
        if self.consecutive_cycles == 0 {
            return Err(ConfigError::ZeroConsecutiveCycles);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDownReason {
    CriticalFrameRate,
    SustainedWarning,
}

impl StepDownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalFrameRate => "critical_frame_rate",
            Self::SustainedWarning => "sustained_warning",
        }
    }
}

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TierDecision {
    Hold,
    StepDown { reason: StepDownReason },
    StepUp,
}

impl TierDecision {
    pub fn is_hold(&self) -> bool {
        matches!(self, TierDecision::Hold)
    }
}

/// Streak counters and cooldown for the transition policy.
///
/// The evaluator only decides; it does not know which tier is active.
/// The controller turns a non-`Hold` decision into an actual transition
/// (or drops it at a table boundary) and reports back via
/// `note_transition` so the cooldown arms only when a transition really
/// happened.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvaluator {
    config: EvaluatorConfig,
    warning_streak: u32,
    target_streak: u32,
    cooldown_remaining: u32,
}

impl StateEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self {
            config,
            warning_streak: 0,
            target_streak: 0,
            cooldown_remaining: 0,
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate one cycle against the rolling average frame rate.
    pub fn evaluate(&mut self, avg_fps: f64) -> TierDecision {
        if self.cooldown_remaining > 0 {
            // Streaks do not accumulate during cooldown; a post-cooldown
            // transition must re-earn its evidence.
            self.cooldown_remaining -= 1;
            return TierDecision::Hold;
        }

        if avg_fps < self.config.critical_fps() {
            self.warning_streak = 0;
            self.target_streak = 0;
            return TierDecision::StepDown {
                reason: StepDownReason::CriticalFrameRate,
            };
        }

        if avg_fps < self.config.warning_fps() {
            self.target_streak = 0;
            self.warning_streak = self.warning_streak.saturating_add(1);
            if self.warning_streak >= self.config.consecutive_cycles {
                self.warning_streak = 0;
                return TierDecision::StepDown {
                    reason: StepDownReason::SustainedWarning,
                };
            }
            return TierDecision::Hold;
        }

        if avg_fps >= self.config.target_fps {
            self.warning_streak = 0;
            self.target_streak = self.target_streak.saturating_add(1);
            if self.target_streak >= self.config.consecutive_cycles {
                self.target_streak = 0;
                return TierDecision::StepUp;
            }
            return TierDecision::Hold;
        }

        // Neutral band between warning and target: stable, reset both.
        self.warning_streak = 0;
        self.target_streak = 0;
        TierDecision::Hold
    }

    /// Arm the cooldown after a transition actually applied.
    pub fn note_transition(&mut self) {
        self.warning_streak = 0;
        self.target_streak = 0;
        self.cooldown_remaining = self.config.cooldown_cycles;
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    pub fn warning_streak(&self) -> u32 {
        self.warning_streak
    }

    pub fn target_streak(&self) -> u32 {
        self.target_streak
    }

    pub fn reset(&mut self) {
        self.warning_streak = 0;
        self.target_streak = 0;
        self.cooldown_remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> StateEvaluator {
        // target 90, warning 72, critical 54, N=3, cooldown 2
        StateEvaluator::new(EvaluatorConfig::default())
    }

    #[test]
    fn default_config_validates() {
        assert!(EvaluatorConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_fail_validation() {
        let config = EvaluatorConfig {
            warning_ratio: 0.5,
            critical_ratio: 0.8,
            ..EvaluatorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedThresholds {
                warning_ratio: 0.5,
                critical_ratio: 0.8,
            })
        );
    }

    #[test]
    fn critical_frame_rate_steps_down_immediately() {
        let mut eval = evaluator();
        assert_eq!(
            eval.evaluate(40.0),
            TierDecision::StepDown {
                reason: StepDownReason::CriticalFrameRate
            }
        );
    }

    #[test]
    fn warning_frame_rate_needs_consecutive_cycles() {
        let mut eval = evaluator();
        assert_eq!(eval.evaluate(60.0), TierDecision::Hold);
        assert_eq!(eval.evaluate(60.0), TierDecision::Hold);
        assert_eq!(
            eval.evaluate(60.0),
            TierDecision::StepDown {
                reason: StepDownReason::SustainedWarning
            }
        );
    }

    #[test]
    fn warning_streak_breaks_on_recovery() {
        let mut eval = evaluator();
        eval.evaluate(60.0);
        eval.evaluate(60.0);
        // Neutral-band cycle resets the streak.
        assert_eq!(eval.evaluate(80.0), TierDecision::Hold);
        assert_eq!(eval.evaluate(60.0), TierDecision::Hold);
        assert_eq!(eval.warning_streak(), 1);
    }

    #[test]
    fn step_up_requires_consecutive_at_target_cycles() {
        let mut eval = evaluator();
        assert_eq!(eval.evaluate(95.0), TierDecision::Hold);
        assert_eq!(eval.evaluate(95.0), TierDecision::Hold);
        assert_eq!(eval.evaluate(95.0), TierDecision::StepUp);
        // The streak was consumed; the next step-up needs three more.
        assert_eq!(eval.evaluate(95.0), TierDecision::Hold);
    }

    #[test]
    fn cooldown_suppresses_transitions() {
        let mut eval = evaluator();
        assert!(!eval.evaluate(40.0).is_hold());
        eval.note_transition();
        assert_eq!(eval.evaluate(40.0), TierDecision::Hold);
        assert_eq!(eval.evaluate(40.0), TierDecision::Hold);
        // Cooldown elapsed; critical frame rate bites again.
        assert_eq!(
            eval.evaluate(40.0),
            TierDecision::StepDown {
                reason: StepDownReason::CriticalFrameRate
            }
        );
    }

    #[test]
    fn cooldown_does_not_accumulate_streaks() {
        let mut eval = evaluator();
        eval.note_transition();
        eval.evaluate(95.0);
        eval.evaluate(95.0);
        assert_eq!(eval.target_streak(), 0);
        // Post-cooldown, evidence starts from scratch.
        assert_eq!(eval.evaluate(95.0), TierDecision::Hold);
        assert_eq!(eval.evaluate(95.0), TierDecision::Hold);
        assert_eq!(eval.evaluate(95.0), TierDecision::StepUp);
    }
}
