//! Probe samples and the bounded window that holds them.
//!
//! # Invariants
//! - `len() <= capacity()` at all times
//! - Iteration order is arrival order (oldest first)
//! - A window belongs to exactly one endpoint role

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, SystemTime};

use serde::Serialize;

/// Which configured endpoint a sample or window belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointRole {
    Primary,
    Healthcheck,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Primary => write!(f, "primary"),
            EndpointRole::Healthcheck => write!(f, "healthcheck"),
        }
    }
}

/// Why a probe produced no round-trip time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Error,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Error => "error",
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Rtt(Duration),
    Failure(FailureKind),
}

/// One recorded probe. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    at: SystemTime,
    role: EndpointRole,
    outcome: ProbeOutcome,
}

impl Sample {
    pub fn new(role: EndpointRole, outcome: ProbeOutcome) -> Self {
        Self {
            at: SystemTime::now(),
            role,
            outcome,
        }
    }

    pub fn rtt(role: EndpointRole, rtt: Duration) -> Self {
        Self::new(role, ProbeOutcome::Rtt(rtt))
    }

    pub fn failure(role: EndpointRole, kind: FailureKind) -> Self {
        Self::new(role, ProbeOutcome::Failure(kind))
    }

    pub fn at(&self) -> SystemTime {
        self.at
    }

    pub fn role(&self) -> EndpointRole {
        self.role
    }

    pub fn outcome(&self) -> ProbeOutcome {
        self.outcome
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Failure(_))
    }

    /// Latency in milliseconds for evaluation. Failures are infinitely slow.
    pub fn latency_ms(&self) -> f64 {
        match self.outcome {
            ProbeOutcome::Rtt(rtt) => rtt.as_secs_f64() * 1000.0,
            ProbeOutcome::Failure(_) => f64::INFINITY,
        }
    }
}

/// Fixed-capacity FIFO of the most recent samples for one endpoint role.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    role: EndpointRole,
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl SlidingWindow {
    /// Create an empty window. `capacity` is validated by the config layer and
    /// clamped to at least one here so the bound always holds.
    pub fn new(role: EndpointRole, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            role,
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample, evicting the oldest one when full.
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn role(&self) -> EndpointRole {
        self.role
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// The most recent `n` samples, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &Sample> {
        self.samples.iter().skip(self.samples.len().saturating_sub(n))
    }

    pub fn failure_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_failure()).count()
    }
}
