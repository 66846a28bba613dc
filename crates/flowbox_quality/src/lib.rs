//! Adaptive quality control for the FlowBox runtime.
//!
//! A tick-driven control loop: sample frame performance, evaluate the
//! rolling average against warning/critical thresholds, and step an
//! ordered quality tier up or down one step at a time, pushing each
//! tier's knob bundle to explicitly registered subsystems.

pub mod applier;
pub mod config;
pub mod controller;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod sampler;
pub mod scheduler;
pub mod tier;
pub mod types;


pub use applier::{OptimizationState, QualityApplier, QualitySubscriber, TierTransition};
pub use config::{
    ControllerConfig, DEFAULT_CONFIG_FILE_NAME, DEFAULT_EVALUATE_EVERY_TICKS,
    DEFAULT_ROLLING_WINDOW, DEFAULT_SAMPLE_INTERVAL_MS, ENV_CONSECUTIVE_CYCLES,
    ENV_COOLDOWN_CYCLES, ENV_CRITICAL_RATIO, ENV_INITIAL_TIER, ENV_SAMPLE_INTERVAL_MS,
    ENV_TARGET_FPS, ENV_WARNING_RATIO,
};
pub use controller::{ControllerMetrics, ControllerTickReport, QualityController};
pub use error::{ApplyError, ConfigError};
pub use evaluator::{
    EvaluatorConfig, StateEvaluator, StepDownReason, TierDecision, DEFAULT_CONSECUTIVE_CYCLES,
    DEFAULT_COOLDOWN_CYCLES, DEFAULT_CRITICAL_RATIO, DEFAULT_TARGET_FPS, DEFAULT_WARNING_RATIO,
};
pub use events::{
    EventJournal, QualityEvent, QualityEventKind, DEFAULT_JOURNAL_CAPACITY,
};
pub use sampler::{
    FrameMetrics, FrameMetricsSource, MetricsSampler, PerformanceSample, RollingAverage,
    SamplerSnapshot, DEFAULT_SAMPLE_WINDOW,
};
pub use scheduler::TickScheduler;
pub use tier::{QualityTier, ShadowQuality, TierConfig, TierTable, MAX_RENDER_SCALE};
pub use types::{QualityEventId, SubscriberId, TickTime};
