//! Fixed-interval tick scheduler.
//!
//! Cooperative single-threaded driving of the controller: logical-clock
//! runs for deterministic tests, wall-clock runs for live sessions.
//! Suspension happens only between ticks; an in-flight tick (and any
//! tier application inside it) always completes.

use std::time::{Duration, Instant};

use crate::controller::{ControllerTickReport, QualityController};
use crate::sampler::FrameMetricsSource;
use crate::types::TickTime;

#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval_ms: u64,
    elapsed_ms: TickTime,
}

impl TickScheduler {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            elapsed_ms: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Logical time of the last completed tick.
    pub fn elapsed_ms(&self) -> TickTime {
        self.elapsed_ms
    }

    /// Advance the logical clock by `ticks` intervals without sleeping.
    pub fn run_ticks<S: FrameMetricsSource>(
        &mut self,
        controller: &mut QualityController<S>,
        ticks: u64,
    ) -> Vec<ControllerTickReport> {
        let mut reports = Vec::with_capacity(ticks as usize);
        for _ in 0..ticks {
            self.elapsed_ms += self.interval_ms;
            reports.push(controller.tick(self.elapsed_ms));
        }
        reports
    }

    /// Tick until `stop` returns true (checked at each tick boundary)
    /// or `max_ticks` elapse.
    pub fn run_until<S, F>(
        &mut self,
        controller: &mut QualityController<S>,
        max_ticks: u64,
        mut stop: F,
    ) -> Vec<ControllerTickReport>
    where
        S: FrameMetricsSource,
        F: FnMut(&ControllerTickReport) -> bool,
    {
        let mut reports = Vec::new();
        for _ in 0..max_ticks {
            self.elapsed_ms += self.interval_ms;
            let report = controller.tick(self.elapsed_ms);
            let done = stop(&report);
            reports.push(report);
            if done {
                break;
            }
        }
        reports
    }

    /// Wall-clock run: tick, then sleep out the remainder of the
    /// interval, until `duration` has elapsed.
    pub fn run_for<S: FrameMetricsSource>(
        &mut self,
        controller: &mut QualityController<S>,
        duration: Duration,
    ) -> Vec<ControllerTickReport> {
        let deadline = Instant::now() + duration;
        let interval = self.interval();
        let mut reports = Vec::new();
        loop {
            let tick_started = Instant::now();
            if tick_started >= deadline {
                break;
            }
            self.elapsed_ms += self.interval_ms;
            reports.push(controller.tick(self.elapsed_ms));
            let spent = tick_started.elapsed();
            if spent < interval {
                std::thread::sleep(interval - spent);
            }
        }
        reports
    }
}
