//! Quality tiers and the per-tier configuration bundle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;

/// Ordered quality presets. `Potato` is the floor the controller can
/// step down to; `Ultra` is the ceiling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Potato,
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl QualityTier {
    pub const ALL: [QualityTier; 5] = [
        QualityTier::Potato,
        QualityTier::Low,
        QualityTier::Medium,
        QualityTier::High,
        QualityTier::Ultra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Potato => "potato",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }

    /// One tier lower, saturating at `Potato`.
    pub fn step_down(self) -> QualityTier {
        match self {
            Self::Potato | Self::Low => Self::Potato,
            Self::Medium => Self::Low,
            Self::High => Self::Medium,
            Self::Ultra => Self::High,
        }
    }

    /// One tier higher, saturating at `Ultra`.
    pub fn step_up(self) -> QualityTier {
        match self {
            Self::Potato => Self::Low,
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Ultra => Self::Ultra,
        }
    }
}

/// Shadow rendering quality knob.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ShadowQuality {
    Off,
    Low,
    #[default]
    Medium,
    High,
}

impl ShadowQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// The knob bundle a tier applies: render scale, shadows, physics solver
/// iterations, and concurrent-object budgets for gameplay spawners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub render_scale: f64,
    pub shadow_quality: ShadowQuality,
    pub physics_iterations: u32,
    pub max_targets: u32,
    pub max_obstacles: u32,
    pub max_particles: u32,
    pub coaching_enabled: bool,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.0,
            shadow_quality: ShadowQuality::Medium,
            physics_iterations: 6,
            max_targets: 24,
            max_obstacles: 12,
            max_particles: 2_000,
            coaching_enabled: true,
        }
    }
}

pub const MAX_RENDER_SCALE: f64 = 2.0;

/// Static map from tier to knob bundle. The table does not have to
/// cover all five tiers; transitions move between the tiers it defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierTable {
    entries: BTreeMap<QualityTier, TierConfig>,
}

impl TierTable {
    pub fn new(entries: BTreeMap<QualityTier, TierConfig>) -> Self {
        Self { entries }
    }

    pub fn get(&self, tier: QualityTier) -> Option<&TierConfig> {
        self.entries.get(&tier)
    }

    pub fn contains(&self, tier: QualityTier) -> bool {
        self.entries.contains_key(&tier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lowest defined tier.
    pub fn lowest(&self) -> Option<QualityTier> {
        self.entries.keys().next().copied()
    }

    /// Highest defined tier.
    pub fn highest(&self) -> Option<QualityTier> {
        self.entries.keys().next_back().copied()
    }

    /// Next defined tier strictly below `tier`, or None at the floor.
    pub fn step_down_from(&self, tier: QualityTier) -> Option<QualityTier> {
        self.entries
            .range(..tier)
            .next_back()
            .map(|(tier, _)| *tier)
    }

    /// Next defined tier strictly above `tier`, or None at the ceiling.
    pub fn step_up_from(&self, tier: QualityTier) -> Option<QualityTier> {
        use std::ops::Bound;
        self.entries
            .range((Bound::Excluded(tier), Bound::Unbounded))
            .next()
            .map(|(tier, _)| *tier)
    }

    pub fn tiers(&self) -> impl Iterator<Item = QualityTier> + '_ {
        self.entries.keys().copied()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyTierTable);
        }
        for (tier, config) in &self.entries {
            if !config.render_scale.is_finite()
                || config.render_scale <= 0.0
                || config.render_scale > MAX_RENDER_SCALE
            {
                return Err(ConfigError::InvalidRenderScale {
                    tier: *tier,
                    scale: config.render_scale,
                });
            }
            if config.physics_iterations == 0 {
                return Err(ConfigError::ZeroPhysicsIterations { tier: *tier });
            }
        }
        Ok(())
    }
}

impl Default for TierTable {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            QualityTier::Potato,
            TierConfig {
                render_scale: 0.5,
                shadow_quality: ShadowQuality::Off,
                physics_iterations: 2,
                max_targets: 8,
                max_obstacles: 4,
                max_particles: 200,
                coaching_enabled: false,
            },
        );
        entries.insert(
            QualityTier::Low,
            TierConfig {
                render_scale: 0.7,
                shadow_quality: ShadowQuality::Off,
                physics_iterations: 4,
                max_targets: 16,
                max_obstacles: 8,
                max_particles: 800,
                coaching_enabled: false,
            },
        );
        entries.insert(QualityTier::Medium, TierConfig::default());
        entries.insert(
            QualityTier::High,
            TierConfig {
                render_scale: 1.2,
                shadow_quality: ShadowQuality::High,
                physics_iterations: 8,
                max_targets: 32,
                max_obstacles: 16,
                max_particles: 5_000,
                coaching_enabled: true,
            },
        );
        entries.insert(
            QualityTier::Ultra,
            TierConfig {
                render_scale: 1.5,
                shadow_quality: ShadowQuality::High,
                physics_iterations: 12,
                max_targets: 48,
                max_obstacles: 24,
                max_particles: 10_000,
                coaching_enabled: true,
            },
        );
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_totally_ordered() {
        assert!(QualityTier::Potato < QualityTier::Low);
        assert!(QualityTier::Low < QualityTier::Medium);
        assert!(QualityTier::Medium < QualityTier::High);
        assert!(QualityTier::High < QualityTier::Ultra);
    }

    #[test]
    fn step_down_and_up_saturate_at_the_ends() {
        assert_eq!(QualityTier::Potato.step_down(), QualityTier::Potato);
        assert_eq!(QualityTier::Ultra.step_up(), QualityTier::Ultra);
        assert_eq!(QualityTier::High.step_down(), QualityTier::Medium);
        assert_eq!(QualityTier::Low.step_up(), QualityTier::Medium);
    }

    #[test]
    fn default_table_defines_all_tiers_and_validates() {
        let table = TierTable::default();
        assert_eq!(table.len(), 5);
        for tier in QualityTier::ALL {
            assert!(table.contains(tier));
        }
        assert_eq!(table.lowest(), Some(QualityTier::Potato));
        assert_eq!(table.highest(), Some(QualityTier::Ultra));
        assert!(table.validate().is_ok());
    }

    #[test]
    fn sparse_table_steps_skip_undefined_tiers() {
        let mut entries = BTreeMap::new();
        entries.insert(QualityTier::Low, TierConfig::default());
        entries.insert(QualityTier::High, TierConfig::default());
        let table = TierTable::new(entries);

        assert_eq!(table.step_down_from(QualityTier::High), Some(QualityTier::Low));
        assert_eq!(table.step_up_from(QualityTier::Low), Some(QualityTier::High));
        assert_eq!(table.step_down_from(QualityTier::Low), None);
        assert_eq!(table.step_up_from(QualityTier::High), None);
        // Undefined middle tier still resolves to its defined neighbors.
        assert_eq!(table.step_down_from(QualityTier::Medium), Some(QualityTier::Low));
        assert_eq!(table.step_up_from(QualityTier::Medium), Some(QualityTier::High));
    }

    #[test]
    fn empty_table_fails_validation() {
        let table = TierTable::new(BTreeMap::new());
        assert_eq!(table.validate(), Err(ConfigError::EmptyTierTable));
    }

    #[test]
    fn out_of_range_render_scale_fails_validation() {
        let mut entries = BTreeMap::new();
        entries.insert(
            QualityTier::Medium,
            TierConfig {
                render_scale: 3.0,
                ..TierConfig::default()
            },
        );
        let table = TierTable::new(entries);
        assert_eq!(
            table.validate(),
            Err(ConfigError::InvalidRenderScale {
                tier: QualityTier::Medium,
                scale: 3.0,
            })
        );
    }

    #[test]
    fn tier_serializes_as_snake_case() {
        let json = serde_json::to_string(&QualityTier::Potato).unwrap();
        assert_eq!(json, "\"potato\"");
        let tier: QualityTier = serde_json::from_str("\"ultra\"").unwrap();
        assert_eq!(tier, QualityTier::Ultra);
    }
}
