//! Window evaluation.
//!
//! # Verdicts
//! ```text
//! len < min_samples          → InsufficientData
//! aggregate >= bad threshold → Bad
//! aggregate <  good threshold → Good
//! otherwise                  → Neutral
//! ```
//!
//! # Design Decisions
//! - Pure function of (window, thresholds): repeated calls agree
//! - Two thresholds give hysteresis; Neutral never drives a transition
//! - Failed probes are `+inf` under every aggregation

use serde::Serialize;

use crate::config::{Aggregation, EvaluationConfig, LatencyThresholds};
use crate::health::window::SlidingWindow;

/// Outcome of evaluating a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthVerdict {
    Good,
    Bad,
    /// Between the good and bad thresholds.
    Neutral,
    InsufficientData,
}

impl HealthVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthVerdict::Good => "good",
            HealthVerdict::Bad => "bad",
            HealthVerdict::Neutral => "neutral",
            HealthVerdict::InsufficientData => "insufficient_data",
        }
    }
}

impl std::fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    min_samples: usize,
    aggregation: Aggregation,
}

impl HealthEvaluator {
    pub fn new(config: &EvaluationConfig) -> Self {
        Self {
            min_samples: config.min_samples.max(1),
            aggregation: config.aggregation,
        }
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn evaluate(&self, window: &SlidingWindow, thresholds: &LatencyThresholds) -> HealthVerdict {
        if window.len() < self.min_samples {
            return HealthVerdict::InsufficientData;
        }

        let bad_ms = thresholds.bad.as_secs_f64() * 1000.0;
        let good_ms = thresholds.good.as_secs_f64() * 1000.0;

        match self.aggregation {
            Aggregation::Consecutive => {
                let tail: Vec<f64> = window.tail(self.min_samples).map(|s| s.latency_ms()).collect();
                if tail.iter().all(|&ms| ms >= bad_ms) {
                    HealthVerdict::Bad
                } else if tail.iter().all(|&ms| ms < good_ms) {
                    HealthVerdict::Good
                } else {
                    HealthVerdict::Neutral
                }
            }
            Aggregation::Mean => {
                let sum: f64 = window.iter().map(|s| s.latency_ms()).sum();
                classify(sum / window.len() as f64, bad_ms, good_ms)
            }
            Aggregation::Percentile { p } => {
                let mut latencies: Vec<f64> = window.iter().map(|s| s.latency_ms()).collect();
                classify(nearest_rank(&mut latencies, p), bad_ms, good_ms)
            }
            Aggregation::Count {
                min_bad_count,
                min_good_count,
            } => {
                let bad = window.iter().filter(|s| s.latency_ms() >= bad_ms).count();
                let good = window.iter().filter(|s| s.latency_ms() < good_ms).count();
                if bad >= min_bad_count {
                    HealthVerdict::Bad
                } else if good >= min_good_count {
                    HealthVerdict::Good
                } else {
                    HealthVerdict::Neutral
                }
            }
        }
    }

    /// Single-number summary of the window under the configured aggregation,
    /// for logs and the status API. `None` while data is insufficient.
    pub fn aggregate_ms(&self, window: &SlidingWindow) -> Option<f64> {
        if window.len() < self.min_samples {
            return None;
        }
        let mut latencies: Vec<f64> = match self.aggregation {
            Aggregation::Consecutive => window.tail(self.min_samples).map(|s| s.latency_ms()).collect(),
            _ => window.iter().map(|s| s.latency_ms()).collect(),
        };
        let value = match self.aggregation {
            Aggregation::Percentile { p } => nearest_rank(&mut latencies, p),
            _ => latencies.iter().sum::<f64>() / latencies.len() as f64,
        };
        Some(value)
    }
}

fn classify(aggregate_ms: f64, bad_ms: f64, good_ms: f64) -> HealthVerdict {
    if aggregate_ms >= bad_ms {
        HealthVerdict::Bad
    } else if aggregate_ms < good_ms {
        HealthVerdict::Good
    } else {
        HealthVerdict::Neutral
    }
}

/// Nearest-rank percentile: index = ceil(p/100 * n) - 1. `values` must be non-empty.
fn nearest_rank(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = ((p / 100.0) * values.len() as f64).ceil() as usize;
    values[rank.clamp(1, values.len()) - 1]
}
