//! QualityController: the owned control loop object.
//!
//! Explicitly constructed and driven by whoever owns the simulation
//! loop; there is no global instance. One `tick` records a sample,
//! evaluates on its cadence, and fully applies any transition before
//! returning.

use serde::{Deserialize, Serialize};

use crate::applier::{OptimizationState, QualityApplier, QualitySubscriber, TierTransition};
use crate::config::ControllerConfig;
use crate::error::ConfigError;
use crate::evaluator::{StateEvaluator, TierDecision};
use crate::events::{EventJournal, QualityEvent, QualityEventKind};
use crate::sampler::{FrameMetricsSource, MetricsSampler, PerformanceSample, SamplerSnapshot};
use crate::tier::{QualityTier, TierTable};
use crate::types::{SubscriberId, TickTime};

/// What one tick did: the sample it recorded, the decision (if this
/// tick was an evaluation cycle), and the transition (if one applied).
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerTickReport {
    pub time: TickTime,
    pub sample: PerformanceSample,
    pub decision: Option<TierDecision>,
    pub transition: Option<TierTransition>,
}

/// Serializable counters for the whole control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerMetrics {
    pub ticks_total: u64,
    pub evaluations_total: u64,
    pub steps_up: u64,
    pub steps_down: u64,
    pub transitions_total: u64,
    pub last_transition_at: Option<TickTime>,
    pub active_tier: QualityTier,
    pub revision: u64,
    pub enabled: bool,
    pub sampler: SamplerSnapshot,
}

pub struct QualityController<S: FrameMetricsSource> {
    source: S,
    sampler: MetricsSampler,
    evaluator: StateEvaluator,
    applier: QualityApplier,
    tiers: TierTable,
    journal: EventJournal,
    rolling_window: usize,
    evaluate_every_ticks: u64,
    enabled: bool,
    ticks_total: u64,
    evaluations_total: u64,
    steps_up: u64,
    steps_down: u64,
    last_transition_at: Option<TickTime>,
    // Journal one PartialSample per streak of partial reads, not per
    // tick, so a permanently absent memory probe cannot flood the
    // journal.
    in_partial_streak: bool,
}

impl<S: FrameMetricsSource> QualityController<S> {
    pub fn new(config: ControllerConfig, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let initial_tier = config
            .resolved_initial_tier()
            .ok_or(ConfigError::EmptyTierTable)?;
        let initial_config = config
            .tiers
            .get(initial_tier)
            .ok_or(ConfigError::UndefinedInitialTier { tier: initial_tier })?
            .clone();
        Ok(Self {
            source,
            sampler: MetricsSampler::new(config.sample_window_capacity, config.frame_budget_ms()),
            evaluator: StateEvaluator::new(config.evaluator.clone()),
            applier: QualityApplier::new(initial_tier, initial_config),
            journal: EventJournal::with_capacity(config.journal_capacity),
            rolling_window: config.rolling_window,
            evaluate_every_ticks: config.evaluate_every_ticks,
            tiers: config.tiers,
            enabled: true,
            ticks_total: 0,
            evaluations_total: 0,
            steps_up: 0,
            steps_down: 0,
            last_transition_at: None,
            in_partial_streak: false,
        })
    }

    /// One cycle of the control loop: sample, evaluate on cadence,
    /// apply. The transition (if any) completes before this returns.
    pub fn tick(&mut self, now: TickTime) -> ControllerTickReport {
        self.ticks_total += 1;

        let metrics = self.source.frame_metrics();
        let sample = self.sampler.record(now, metrics);
        if sample.partial {
            if !self.in_partial_streak {
                self.journal.record(now, QualityEventKind::PartialSample);
            }
            self.in_partial_streak = true;
        } else {
            self.in_partial_streak = false;
        }

        let mut decision = None;
        let mut transition = None;
        if self.enabled && self.ticks_total % self.evaluate_every_ticks == 0 {
            if let Some(average) = self.sampler.rolling_average(self.rolling_window) {
                self.evaluations_total += 1;
                let cycle_decision = self.evaluator.evaluate(average.frame_rate_hz);
                transition = self.apply_decision(cycle_decision, now);
                decision = Some(cycle_decision);
            }
        }

        ControllerTickReport {
            time: now,
            sample,
            decision,
            transition,
        }
    }

    // A decision at a table boundary (already at the lowest or highest
    // defined tier) is dropped without arming the cooldown.
    fn apply_decision(&mut self, decision: TierDecision, now: TickTime) -> Option<TierTransition> {
        let current = self.applier.state().tier;
        let target = match decision {
            TierDecision::Hold => return None,
            TierDecision::StepDown { .. } => self.tiers.step_down_from(current)?,
            TierDecision::StepUp => self.tiers.step_up_from(current)?,
        };
        let config = self.tiers.get(target)?.clone();
        let transition = self
            .applier
            .apply_tier(target, &config, now, &mut self.journal)?;
        self.evaluator.note_transition();
        self.last_transition_at = Some(now);
        if transition.to > transition.from {
            self.steps_up += 1;
        } else {
            self.steps_down += 1;
        }
        Some(transition)
    }

    /// Enable or disable evaluation. Takes effect at the next tick
    /// boundary; sampling continues either way.
    pub fn set_enabled(&mut self, enabled: bool, now: TickTime) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        let kind = if enabled {
            QualityEventKind::ControllerEnabled
        } else {
            QualityEventKind::ControllerDisabled
        };
        self.journal.record(now, kind);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn register_subscriber(&mut self, subscriber: Box<dyn QualitySubscriber>) -> SubscriberId {
        self.applier.register(subscriber)
    }

    pub fn unregister_subscriber(
        &mut self,
        id: SubscriberId,
    ) -> Option<Box<dyn QualitySubscriber>> {
        self.applier.unregister(id)
    }

    /// Push the current state to all subscribers, for subsystems that
    /// registered after construction.
    pub fn reapply(&mut self, now: TickTime) {
        self.applier.force_reapply(now, &mut self.journal);
    }

    pub fn state(&self) -> &OptimizationState {
        self.applier.state()
    }

    pub fn active_tier(&self) -> QualityTier {
        self.applier.state().tier
    }

    pub fn tier_table(&self) -> &TierTable {
        &self.tiers
    }

    pub fn latest_sample(&self) -> Option<&PerformanceSample> {
        self.sampler.latest_sample()
    }

    pub fn events(&self) -> impl Iterator<Item = &QualityEvent> {
        self.journal.events()
    }

    pub fn drain_events(&mut self) -> Vec<QualityEvent> {
        self.journal.drain()
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn metrics(&self) -> ControllerMetrics {
        ControllerMetrics {
            ticks_total: self.ticks_total,
            evaluations_total: self.evaluations_total,
            steps_up: self.steps_up,
            steps_down: self.steps_down,
            transitions_total: self.steps_up + self.steps_down,
            last_transition_at: self.last_transition_at,
            active_tier: self.applier.state().tier,
            revision: self.applier.state().revision,
            enabled: self.enabled,
            sampler: self.sampler.snapshot(),
        }
    }
}

impl<S: FrameMetricsSource> std::fmt::Debug for QualityController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityController")
            .field("tier", &self.applier.state().tier)
            .field("enabled", &self.enabled)
            .field("ticks_total", &self.ticks_total)
            .finish()
    }
}
