//! Link mode state machine.
//!
//! # States
//! - Online: primary endpoint probed, normal operation
//! - Healthcheck: link degraded, secondary endpoint probed until recovery
//!
//! # State Transitions
//! ```text
//! Online      → Healthcheck: primary window evaluates Bad
//! Healthcheck → Online:      healthcheck window evaluates Good
//! Healthcheck → Healthcheck: healthcheck window evaluates Bad; the window
//!                            restarts and the connection is rebuilt
//! ```
//!
//! # Design Decisions
//! - Mode and active window change together inside `record`
//! - Each transition starts an empty window for the new endpoint
//! - Exactly one `ModeEvent` per transition

use std::fmt;
use std::time::SystemTime;

use serde::Serialize;

use crate::config::{EndpointConfig, EvaluationConfig};
use crate::health::evaluator::{HealthEvaluator, HealthVerdict};
use crate::health::notify::{ModeEvent, ModeNotifier, NotifyError};
use crate::health::window::{EndpointRole, Sample, SlidingWindow};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Online,
    Healthcheck,
}

impl Mode {
    /// Endpoint probed while in this mode.
    pub fn role(&self) -> EndpointRole {
        match self {
            Mode::Online => EndpointRole::Primary,
            Mode::Healthcheck => EndpointRole::Healthcheck,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Online => "online",
            Mode::Healthcheck => "healthcheck",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ModeController {
    mode: Mode,
    window: SlidingWindow,
    window_size: usize,
    evaluator: HealthEvaluator,
    primary: EndpointConfig,
    healthcheck: EndpointConfig,
    last_verdict: Option<HealthVerdict>,
    transitions: u64,
    notifier: ModeNotifier,
}

impl ModeController {
    /// Start in `Online` with an empty primary window.
    pub fn new(
        primary: EndpointConfig,
        healthcheck: EndpointConfig,
        evaluation: &EvaluationConfig,
        notifier: ModeNotifier,
    ) -> Self {
        metrics::record_mode(Mode::Online);
        Self {
            mode: Mode::Online,
            window: SlidingWindow::new(EndpointRole::Primary, evaluation.window_size),
            window_size: evaluation.window_size,
            evaluator: HealthEvaluator::new(evaluation),
            primary,
            healthcheck,
            last_verdict: None,
            transitions: 0,
            notifier,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Verdict from the most recent sample, `None` right after a transition.
    pub fn last_verdict(&self) -> Option<HealthVerdict> {
        self.last_verdict
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn notifier(&self) -> &ModeNotifier {
        &self.notifier
    }

    pub fn evaluator(&self) -> &HealthEvaluator {
        &self.evaluator
    }

    pub fn endpoint(&self, role: EndpointRole) -> &EndpointConfig {
        match role {
            EndpointRole::Primary => &self.primary,
            EndpointRole::Healthcheck => &self.healthcheck,
        }
    }

    /// Endpoint the next probe should target.
    pub fn active_endpoint(&self) -> &EndpointConfig {
        self.endpoint(self.mode.role())
    }

    /// Record a sample into the active window, re-evaluate, and transition if
    /// the verdict calls for it.
    ///
    /// Samples taken against an endpoint that is no longer active are dropped.
    pub fn record(&mut self, sample: Sample) -> Option<ModeEvent> {
        if sample.role() != self.window.role() {
            tracing::warn!(
                sample_role = %sample.role(),
                active_role = %self.window.role(),
                "Discarding sample for inactive endpoint"
            );
            return None;
        }

        self.window.push(sample);
        let endpoint = self.active_endpoint();
        let verdict = self.evaluator.evaluate(&self.window, &endpoint.thresholds());
        tracing::debug!(
            mode = %self.mode,
            endpoint = %endpoint.name,
            samples = self.window.len(),
            aggregate_ms = ?self.evaluator.aggregate_ms(&self.window),
            verdict = %verdict,
            "Window evaluated"
        );
        self.last_verdict = Some(verdict);

        let next = match (self.mode, verdict) {
            (Mode::Online, HealthVerdict::Bad) => Mode::Healthcheck,
            (Mode::Healthcheck, HealthVerdict::Good) => Mode::Online,
            _ => return None,
        };
        Some(self.transition(next, verdict))
    }

    /// Start the healthcheck window over when it evaluated Bad.
    ///
    /// Returns `true` when the window was restarted; the caller should then
    /// rebuild its connection to the healthcheck endpoint.
    pub fn restart_bad_healthcheck(&mut self) -> bool {
        if self.mode != Mode::Healthcheck || self.last_verdict != Some(HealthVerdict::Bad) {
            return false;
        }

        tracing::info!(
            endpoint = %self.healthcheck.name,
            samples = self.window.len(),
            "Healthcheck window bad, starting over"
        );
        self.window = SlidingWindow::new(EndpointRole::Healthcheck, self.window_size);
        self.last_verdict = None;
        true
    }

    fn transition(&mut self, next: Mode, verdict: HealthVerdict) -> ModeEvent {
        let previous = self.mode;
        self.mode = next;
        self.window = SlidingWindow::new(next.role(), self.window_size);
        self.last_verdict = None;
        self.transitions += 1;

        tracing::info!(
            from = %previous,
            to = %next,
            verdict = %verdict,
            endpoint = %self.active_endpoint().name,
            "Link mode changed"
        );
        metrics::record_transition(next);

        let event = ModeEvent {
            mode: next,
            at: SystemTime::now(),
            verdict,
        };
        match self.notifier.publish(event.clone()) {
            Ok(_) => {}
            Err(err @ NotifyError::NoSubscribers) => {
                tracing::debug!(error = %err, "Mode change not delivered");
            }
            Err(err) => tracing::warn!(error = %err, "Mode change not delivered"),
        }
        event
    }
}
