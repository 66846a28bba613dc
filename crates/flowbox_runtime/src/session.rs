//! Session: the composition root that wires the controller to the
//! runtime subsystems and drives it on a fixed-interval scheduler.

use std::time::Duration;

use flowbox_quality::{
    ConfigError, ControllerConfig, ControllerMetrics, ControllerTickReport, FrameMetricsSource,
    QualityController, QualityEvent, TickScheduler,
};

use crate::gameplay::ObjectBudget;
use crate::physics::PhysicsSettings;
use crate::render::RenderSettings;

pub const DEFAULT_MAX_RESOLUTION_SCALE: f64 = 2.0;
pub const DEFAULT_MAX_SOLVER_ITERATIONS: u32 = 16;

pub struct Session<S: FrameMetricsSource> {
    controller: QualityController<S>,
    scheduler: TickScheduler,
    render: RenderSettings,
    physics: PhysicsSettings,
    budget: ObjectBudget,
}

impl<S: FrameMetricsSource> Session<S> {
    /// Build the controller, register the runtime subsystems, and push
    /// the initial tier into them so everything starts in sync.
    pub fn new(config: ControllerConfig, source: S) -> Result<Self, ConfigError> {
        let interval_ms = config.sample_interval_ms;
        let mut controller = QualityController::new(config, source)?;

        let render = RenderSettings::new(DEFAULT_MAX_RESOLUTION_SCALE);
        let physics = PhysicsSettings::new(DEFAULT_MAX_SOLVER_ITERATIONS);
        let budget = ObjectBudget::new();
        controller.register_subscriber(Box::new(render.clone()));
        controller.register_subscriber(Box::new(physics.clone()));
        controller.register_subscriber(Box::new(budget.clone()));
        controller.reapply(0);

        Ok(Self {
            controller,
            scheduler: TickScheduler::new(interval_ms),
            render,
            physics,
            budget,
        })
    }

    /// Logical-clock run (no sleeping).
    pub fn run_ticks(&mut self, ticks: u64) -> Vec<ControllerTickReport> {
        self.scheduler.run_ticks(&mut self.controller, ticks)
    }

    /// Wall-clock run at the configured sample interval.
    pub fn run_for(&mut self, duration: Duration) -> Vec<ControllerTickReport> {
        self.scheduler.run_for(&mut self.controller, duration)
    }

    pub fn controller(&self) -> &QualityController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut QualityController<S> {
        &mut self.controller
    }

    pub fn render(&self) -> &RenderSettings {
        &self.render
    }

    pub fn physics(&self) -> &PhysicsSettings {
        &self.physics
    }

    pub fn budget(&self) -> &ObjectBudget {
        &self.budget
    }

    pub fn drain_events(&mut self) -> Vec<QualityEvent> {
        self.controller.drain_events()
    }

    pub fn metrics(&self) -> ControllerMetrics {
        self.controller.metrics()
    }
}
