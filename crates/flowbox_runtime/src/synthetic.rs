//! Synthetic frame-load source for demos and tests.

use flowbox_quality::{FrameMetrics, FrameMetricsSource};

/// Plays phases of constant frame time, each lasting a fixed number of
/// ticks, looping over the phase list. Memory creeps up slowly to give
/// the samples a realistic shape.
#[derive(Debug, Clone)]
pub struct SyntheticLoad {
    phases: Vec<LoadPhase>,
    phase_index: usize,
    ticks_in_phase: u64,
    memory_mb: f64,
    pub memory_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadPhase {
    pub frame_time_ms: f64,
    pub ticks: u64,
}

impl SyntheticLoad {
    pub fn new(phases: Vec<LoadPhase>) -> Self {
        let phases = if phases.is_empty() {
            vec![LoadPhase {
                frame_time_ms: 11.0,
                ticks: u64::MAX,
            }]
        } else {
            phases
        };
        Self {
            phases,
            phase_index: 0,
            ticks_in_phase: 0,
            memory_mb: 768.0,
            memory_available: true,
        }
    }

    /// A session that starts overloaded and recovers: useful for
    /// watching the controller step down and climb back.
    pub fn spike_then_recover() -> Self {
        Self::new(vec![
            LoadPhase {
                frame_time_ms: 26.0,
                ticks: 8,
            },
            LoadPhase {
                frame_time_ms: 14.0,
                ticks: 6,
            },
            LoadPhase {
                frame_time_ms: 10.0,
                ticks: 16,
            },
        ])
    }
}

impl FrameMetricsSource for SyntheticLoad {
    fn frame_metrics(&mut self) -> FrameMetrics {
        let phase = self.phases[self.phase_index.min(self.phases.len() - 1)];
        self.ticks_in_phase += 1;
        if self.ticks_in_phase >= phase.ticks {
            self.ticks_in_phase = 0;
            self.phase_index = (self.phase_index + 1) % self.phases.len();
        }
        self.memory_mb += 0.25;
        FrameMetrics {
            frame_time_ms: phase.frame_time_ms,
            memory_mb: if self.memory_available {
                Some(self.memory_mb)
            } else {
                None
            },
            draw_calls: Some(900),
            triangles: Some(450_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_and_loop() {
        let mut load = SyntheticLoad::new(vec![
            LoadPhase {
                frame_time_ms: 20.0,
                ticks: 2,
            },
            LoadPhase {
                frame_time_ms: 10.0,
                ticks: 1,
            },
        ]);
        let times: Vec<f64> = (0..6).map(|_| load.frame_metrics().frame_time_ms).collect();
        assert_eq!(times, vec![20.0, 20.0, 10.0, 20.0, 20.0, 10.0]);
    }
}
