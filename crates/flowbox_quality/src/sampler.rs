//! Metrics sampler: one performance sample per tick into a bounded
//! rolling window.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::TickTime;

/// One periodic measurement of runtime performance. Immutable once
/// recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub time: TickTime,
    pub frame_time_ms: f64,
    pub frame_rate_hz: f64,
    pub memory_mb: f64,
    pub draw_calls: Option<u64>,
    pub triangles: Option<u64>,
    /// True when a metric source was missing and a default was
    /// substituted.
    pub partial: bool,
}

/// Raw readings the sampler turns into a `PerformanceSample`.
///
/// Frame time is mandatory; everything else is best-effort. A missing
/// memory reading is substituted with 0 and flagged as partial — the
/// sampler never fails.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameMetrics {
    pub frame_time_ms: f64,
    pub memory_mb: Option<f64>,
    pub draw_calls: Option<u64>,
    pub triangles: Option<u64>,
}

/// The probe the control loop reads every tick.
pub trait FrameMetricsSource {
    fn frame_metrics(&mut self) -> FrameMetrics;
}

/// Mean frame time and frame rate over the most recent samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingAverage {
    pub frame_time_ms: f64,
    pub frame_rate_hz: f64,
    pub samples: usize,
}

/// Serializable summary of the sampler's window and lifetime counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SamplerSnapshot {
    pub samples_total: u64,
    pub partial_total: u64,
    pub samples_window: usize,
    pub budget_ms: f64,
    pub last_ms: f64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub over_budget_total: u64,
    pub over_budget_ratio_ppm: u64,
}

impl SamplerSnapshot {
    pub fn has_samples(&self) -> bool {
        self.samples_total > 0
    }
}

pub const DEFAULT_SAMPLE_WINDOW: usize = 64;

/// Bounded ring of `PerformanceSample`s plus lifetime statistics.
#[derive(Debug, Clone)]
pub struct MetricsSampler {
    window: VecDeque<PerformanceSample>,
    capacity: usize,
    budget_ms: f64,
    samples_total: u64,
    partial_total: u64,
    valid_total: u64,
    over_budget_total: u64,
    total_ms: f64,
    last_ms: f64,
    min_ms: f64,
    max_ms: f64,
}

impl MetricsSampler {
    /// `budget_ms` is the per-frame time budget (1000 / target fps) used
    /// only for over-budget bookkeeping in snapshots.
    pub fn new(capacity: usize, budget_ms: f64) -> Self {
        Self {
            window: VecDeque::new(),
            capacity: capacity.max(1),
            budget_ms,
            samples_total: 0,
            partial_total: 0,
            valid_total: 0,
            over_budget_total: 0,
            total_ms: 0.0,
            last_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        }
    }

    /// Record one sample. Non-finite or non-positive frame times are
    /// recorded as fully partial zero samples and kept out of the
    /// rolling window so they cannot skew averages.
    pub fn record(&mut self, time: TickTime, metrics: FrameMetrics) -> PerformanceSample {
        let frame_time_valid = metrics.frame_time_ms.is_finite() && metrics.frame_time_ms > 0.0;
        let memory_missing = metrics.memory_mb.is_none();
        let partial = memory_missing || !frame_time_valid;

        let frame_time_ms = if frame_time_valid {
            metrics.frame_time_ms
        } else {
            0.0
        };
        let frame_rate_hz = if frame_time_valid {
            1000.0 / frame_time_ms
        } else {
            0.0
        };

        let sample = PerformanceSample {
            time,
            frame_time_ms,
            frame_rate_hz,
            memory_mb: metrics.memory_mb.unwrap_or(0.0),
            draw_calls: metrics.draw_calls,
            triangles: metrics.triangles,
            partial,
        };

        self.samples_total = self.samples_total.saturating_add(1);
        if partial {
            self.partial_total = self.partial_total.saturating_add(1);
        }
        if frame_time_valid {
            self.valid_total = self.valid_total.saturating_add(1);
            self.total_ms += frame_time_ms;
            self.last_ms = frame_time_ms;
            if self.valid_total == 1 {
                self.min_ms = frame_time_ms;
                self.max_ms = frame_time_ms;
            } else {
                self.min_ms = self.min_ms.min(frame_time_ms);
                self.max_ms = self.max_ms.max(frame_time_ms);
            }
            if self.budget_ms > 0.0 && frame_time_ms > self.budget_ms {
                self.over_budget_total = self.over_budget_total.saturating_add(1);
            }
            self.window.push_back(sample.clone());
            while self.window.len() > self.capacity {
                self.window.pop_front();
            }
        }
        sample
    }

    pub fn latest_sample(&self) -> Option<&PerformanceSample> {
        self.window.back()
    }

    /// Mean over the last `window` valid samples, clamped to what the
    /// ring holds. None while the ring is empty.
    pub fn rolling_average(&self, window: usize) -> Option<RollingAverage> {
        if self.window.is_empty() || window == 0 {
            return None;
        }
        let take = window.min(self.window.len());
        let start = self.window.len() - take;
        let mut total_time = 0.0;
        let mut total_rate = 0.0;
        for sample in self.window.iter().skip(start) {
            total_time += sample.frame_time_ms;
            total_rate += sample.frame_rate_hz;
        }
        Some(RollingAverage {
            frame_time_ms: total_time / take as f64,
            frame_rate_hz: total_rate / take as f64,
            samples: take,
        })
    }

    pub fn snapshot(&self) -> SamplerSnapshot {
        let mut frame_times: Vec<f64> = self.window.iter().map(|s| s.frame_time_ms).collect();
        frame_times
            .sort_by(|left, right| left.partial_cmp(right).unwrap_or(std::cmp::Ordering::Equal));
        let avg_ms = if self.valid_total > 0 {
            self.total_ms / self.valid_total as f64
        } else {
            0.0
        };
        let over_budget_ratio_ppm = if self.valid_total > 0 {
            self.over_budget_total.saturating_mul(1_000_000) / self.valid_total
        } else {
            0
        };
        SamplerSnapshot {
            samples_total: self.samples_total,
            partial_total: self.partial_total,
            samples_window: self.window.len(),
            budget_ms: self.budget_ms,
            last_ms: self.last_ms,
            avg_ms,
            min_ms: self.min_ms,
            max_ms: self.max_ms,
            p50_ms: percentile(&frame_times, 0.50),
            p95_ms: percentile(&frame_times, 0.95),
            p99_ms: percentile(&frame_times, 0.99),
            over_budget_total: self.over_budget_total,
            over_budget_ratio_ppm,
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.samples_total = 0;
        self.partial_total = 0;
        self.valid_total = 0;
        self.over_budget_total = 0;
        self.total_ms = 0.0;
        self.last_ms = 0.0;
        self.min_ms = 0.0;
        self.max_ms = 0.0;
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn percentile(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() - 1) as f64 * percentile.clamp(0.0, 1.0)).round() as usize;
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ms: f64) -> FrameMetrics {
        FrameMetrics {
            frame_time_ms: ms,
            memory_mb: Some(512.0),
            draw_calls: None,
            triangles: None,
        }
    }

    #[test]
    fn window_evicts_oldest_at_capacity() {
        let mut sampler = MetricsSampler::new(3, 11.1);
        for (i, ms) in [10.0, 20.0, 30.0, 40.0].iter().enumerate() {
            sampler.record(i as TickTime, frame(*ms));
        }
        assert_eq!(sampler.len(), 3);
        let snapshot = sampler.snapshot();
        assert_eq!(snapshot.samples_total, 4);
        assert_eq!(snapshot.samples_window, 3);
        assert!((snapshot.p50_ms - 30.0).abs() < f64::EPSILON);
        assert!((snapshot.p99_ms - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_memory_substitutes_zero_and_flags_partial() {
        let mut sampler = MetricsSampler::new(8, 11.1);
        let sample = sampler.record(
            0,
            FrameMetrics {
                frame_time_ms: 12.0,
                memory_mb: None,
                draw_calls: None,
                triangles: None,
            },
        );
        assert!(sample.partial);
        assert_eq!(sample.memory_mb, 0.0);
        // The frame time was valid, so the sample still feeds the window.
        assert_eq!(sampler.len(), 1);
        assert_eq!(sampler.snapshot().partial_total, 1);
    }

    #[test]
    fn invalid_frame_time_is_kept_out_of_the_window() {
        let mut sampler = MetricsSampler::new(8, 11.1);
        sampler.record(0, frame(10.0));
        let bogus = sampler.record(1, frame(f64::NAN));
        assert!(bogus.partial);
        assert_eq!(bogus.frame_time_ms, 0.0);
        assert_eq!(sampler.len(), 1);
        let avg = sampler.rolling_average(8).unwrap();
        assert!((avg.frame_time_ms - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rolling_average_clamps_to_available_samples() {
        let mut sampler = MetricsSampler::new(8, 11.1);
        assert!(sampler.rolling_average(4).is_none());
        sampler.record(0, frame(10.0));
        sampler.record(1, frame(20.0));
        let avg = sampler.rolling_average(4).unwrap();
        assert_eq!(avg.samples, 2);
        assert!((avg.frame_time_ms - 15.0).abs() < f64::EPSILON);
        assert!((avg.frame_rate_hz - 75.0).abs() < f64::EPSILON);

        let last_only = sampler.rolling_average(1).unwrap();
        assert!((last_only.frame_time_ms - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn over_budget_counting_tracks_the_frame_budget() {
        let mut sampler = MetricsSampler::new(8, 11.1);
        sampler.record(0, frame(10.0));
        sampler.record(1, frame(12.0));
        sampler.record(2, frame(25.0));
        let snapshot = sampler.snapshot();
        assert_eq!(snapshot.over_budget_total, 2);
        assert!(snapshot.over_budget_ratio_ppm > 600_000);
    }

    #[test]
    fn reset_clears_window_and_counters() {
        let mut sampler = MetricsSampler::new(8, 11.1);
        sampler.record(0, frame(10.0));
        sampler.reset();
        assert!(sampler.is_empty());
        let snapshot = sampler.snapshot();
        assert_eq!(snapshot.samples_total, 0);
        assert!(!snapshot.has_samples());
    }
}
