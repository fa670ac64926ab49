//! Timer-driven probe loop.
//!
//! # Responsibilities
//! - Tick at the active endpoint's probe interval
//! - Run one probe → record → evaluate → maybe transition per tick
//! - Release the previous endpoint after a transition
//! - Rebuild the healthcheck connection after a bad healthcheck window
//! - Publish a read-only status snapshot after every cycle
//! - Stop cleanly on shutdown, cancelling any in-flight probe

use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::{validate_config, ConfigError, MonitorConfig};
use crate::health::controller::{Mode, ModeController};
use crate::health::evaluator::HealthVerdict;
use crate::health::notify::{ModeEvent, ModeNotifier};
use crate::health::sampler::LatencySampler;
use crate::health::window::{ProbeOutcome, Sample};
use crate::probe::ProbeAdapter;

/// Point-in-time view of the monitor, safe to read from any task.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub mode: Mode,
    pub endpoint: String,
    pub last_verdict: Option<HealthVerdict>,
    pub aggregate_ms: Option<f64>,
    pub last_latency_ms: Option<f64>,
    pub window_len: usize,
    pub window_capacity: usize,
    pub window_failures: usize,
    pub transitions: u64,
    #[serde(serialize_with = "crate::health::serialize_unix_ms")]
    pub updated_at: SystemTime,
}

impl MonitorStatus {
    fn capture(controller: &ModeController) -> Self {
        let window = controller.window();
        Self {
            mode: controller.mode(),
            endpoint: controller.active_endpoint().name.clone(),
            last_verdict: controller.last_verdict(),
            aggregate_ms: controller.evaluator().aggregate_ms(window),
            last_latency_ms: window.latest().and_then(|s| match s.outcome() {
                ProbeOutcome::Rtt(rtt) => Some(rtt.as_secs_f64() * 1000.0),
                ProbeOutcome::Failure(_) => None,
            }),
            window_len: window.len(),
            window_capacity: window.capacity(),
            window_failures: window.failure_count(),
            transitions: controller.transitions(),
            updated_at: SystemTime::now(),
        }
    }
}

/// Read-only access to a running monitor.
#[derive(Clone)]
pub struct MonitorHandle {
    status: Arc<ArcSwap<MonitorStatus>>,
    notifier: ModeNotifier,
}

impl MonitorHandle {
    pub fn mode(&self) -> Mode {
        self.status.load().mode
    }

    pub fn last_verdict(&self) -> Option<HealthVerdict> {
        self.status.load().last_verdict
    }

    pub fn status(&self) -> Arc<MonitorStatus> {
        self.status.load_full()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModeEvent> {
        self.notifier.subscribe()
    }

    /// See [`ModeNotifier::on_change`].
    pub fn on_change<F, Fut>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(ModeEvent) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.notifier.on_change(callback)
    }
}

/// What one recorded sample did to the controller.
enum Cycle {
    Held,
    Transitioned(ModeEvent),
    /// Bad healthcheck window discarded; its connection should be rebuilt.
    Restarted,
}

pub struct LinkMonitor {
    controller: ModeController,
    sampler: LatencySampler,
    status: Arc<ArcSwap<MonitorStatus>>,
}

impl LinkMonitor {
    /// Build a monitor in `Online` mode. Fails fast on invalid configuration.
    pub fn new(config: &MonitorConfig, adapter: Arc<dyn ProbeAdapter>) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let controller = ModeController::new(
            config.primary.clone(),
            config.healthcheck.clone(),
            &config.evaluation,
            ModeNotifier::new(),
        );
        let status = Arc::new(ArcSwap::from_pointee(MonitorStatus::capture(&controller)));

        Ok(Self {
            controller,
            sampler: LatencySampler::new(adapter),
            status,
        })
    }

    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            status: self.status.clone(),
            notifier: self.controller.notifier().clone(),
        }
    }

    /// One probe → evaluate → maybe-transition cycle against the active endpoint.
    pub async fn run_cycle(&mut self) -> Option<ModeEvent> {
        let endpoint = self.controller.active_endpoint().clone();
        let sample = self.sampler.probe(&endpoint, self.controller.mode().role()).await;
        match self.apply(sample) {
            Cycle::Transitioned(event) => {
                self.release_inactive().await;
                Some(event)
            }
            Cycle::Restarted => {
                self.release_active().await;
                None
            }
            Cycle::Held => None,
        }
    }

    fn apply(&mut self, sample: Sample) -> Cycle {
        let cycle = match self.controller.record(sample) {
            Some(event) => Cycle::Transitioned(event),
            None if self.controller.restart_bad_healthcheck() => Cycle::Restarted,
            None => Cycle::Held,
        };
        self.status.store(Arc::new(MonitorStatus::capture(&self.controller)));
        cycle
    }

    async fn release_active(&self) {
        let endpoint = self.controller.active_endpoint().clone();
        self.sampler.adapter().release(&endpoint).await;
    }

    /// Release the endpoint the last transition moved away from.
    async fn release_inactive(&self) {
        let inactive = match self.controller.mode() {
            Mode::Online => Mode::Healthcheck,
            Mode::Healthcheck => Mode::Online,
        };
        let endpoint = self.controller.endpoint(inactive.role()).clone();
        self.sampler.adapter().release(&endpoint).await;
    }

    /// Probe until `shutdown` fires. An in-flight probe is dropped on shutdown
    /// and never recorded.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            primary = %self.controller.endpoint(Mode::Online.role()).url,
            healthcheck = %self.controller.endpoint(Mode::Healthcheck.role()).url,
            window_size = self.controller.window().capacity(),
            min_samples = self.controller.evaluator().min_samples(),
            "Link monitor starting"
        );

        'modes: loop {
            let endpoint = self.controller.active_endpoint().clone();
            let role = self.controller.mode().role();
            let mut ticker = time::interval(endpoint.probe_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::debug!(
                mode = %self.controller.mode(),
                endpoint = %endpoint.name,
                interval_ms = endpoint.probe_interval_ms,
                "Probe cadence set"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.recv() => break 'modes,
                }

                let sample = tokio::select! {
                    sample = self.sampler.probe(&endpoint, role) => sample,
                    _ = shutdown.recv() => {
                        tracing::debug!(endpoint = %endpoint.name, "In-flight probe cancelled");
                        break 'modes;
                    }
                };

                match self.apply(sample) {
                    Cycle::Transitioned(_) => {
                        tokio::select! {
                            _ = self.release_inactive() => {}
                            _ = shutdown.recv() => break 'modes,
                        }
                        continue 'modes;
                    }
                    Cycle::Restarted => {
                        tokio::select! {
                            _ = self.release_active() => {}
                            _ = shutdown.recv() => break 'modes,
                        }
                    }
                    Cycle::Held => {}
                }
            }
        }

        self.release_active().await;
        tracing::info!(mode = %self.controller.mode(), "Link monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Aggregation;
    use crate::probe::ProbeError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Constant(Duration);

    #[async_trait]
    impl ProbeAdapter for Constant {
        async fn measure(&self, _endpoint: &crate::config::EndpointConfig) -> Result<Duration, ProbeError> {
            Ok(self.0)
        }
    }

    fn config() -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.evaluation.window_size = 5;
        config.evaluation.min_samples = 3;
        config.evaluation.aggregation = Aggregation::Consecutive;
        config
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = config();
        config.evaluation.window_size = 0;
        let result = LinkMonitor::new(&config, Arc::new(Constant(Duration::ZERO)));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn test_status_snapshot_follows_cycles() {
        let mut monitor =
            LinkMonitor::new(&config(), Arc::new(Constant(Duration::from_millis(900)))).unwrap();
        let handle = monitor.handle();
        assert_eq!(handle.mode(), Mode::Online);
        assert_eq!(handle.last_verdict(), None);

        monitor.run_cycle().await;
        let status = handle.status();
        assert_eq!(status.window_len, 1);
        assert_eq!(status.last_verdict, Some(HealthVerdict::InsufficientData));
        assert_eq!(status.last_latency_ms, Some(900.0));

        monitor.run_cycle().await;
        let event = monitor.run_cycle().await.unwrap();
        assert_eq!(event.mode, Mode::Healthcheck);
        assert_eq!(handle.mode(), Mode::Healthcheck);
        assert_eq!(handle.status().endpoint, "healthcheck");
        assert_eq!(handle.status().window_len, 0);
        assert_eq!(handle.status().transitions, 1);
    }
}
