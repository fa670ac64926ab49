//! Mode-change notifications.
//!
//! The controller publishes one [`ModeEvent`] per transition on a broadcast
//! channel. Publishing never waits on subscribers: a slow subscriber loses the
//! oldest events and sees `Lagged` on its next receive.

use std::future::Future;
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::health::controller::Mode;
use crate::health::evaluator::HealthVerdict;

/// Buffered events per subscriber before it starts lagging.
const EVENT_BUFFER: usize = 16;

/// Emitted exactly once per mode transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeEvent {
    pub mode: Mode,
    #[serde(serialize_with = "crate::health::serialize_unix_ms")]
    pub at: SystemTime,
    pub verdict: HealthVerdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("no subscribers registered for mode events")]
    NoSubscribers,

    #[error("subscriber lagged and dropped {0} mode events")]
    Lagged(u64),
}

/// Publisher side of the mode-change channel.
#[derive(Debug, Clone)]
pub struct ModeNotifier {
    tx: broadcast::Sender<ModeEvent>,
}

impl ModeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ModeEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget publish. Returns how many subscribers were reached.
    pub fn publish(&self, event: ModeEvent) -> Result<usize, NotifyError> {
        self.tx.send(event).map_err(|_| NotifyError::NoSubscribers)
    }

    /// Run `callback` for every future event on its own task.
    ///
    /// The callback is awaited on the spawned task, so a slow callback delays
    /// only its own deliveries and never the sampling loop.
    pub fn on_change<F, Fut>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(ModeEvent) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => callback(event).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        let err = NotifyError::Lagged(missed);
                        tracing::warn!(error = %err, "Mode change callback fell behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for ModeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn event(mode: Mode) -> ModeEvent {
        ModeEvent {
            mode,
            at: SystemTime::now(),
            verdict: HealthVerdict::Bad,
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_reported() {
        let notifier = ModeNotifier::new();
        assert_eq!(
            notifier.publish(event(Mode::Healthcheck)),
            Err(NotifyError::NoSubscribers)
        );
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let notifier = ModeNotifier::new();
        let mut rx = notifier.subscribe();

        assert_eq!(notifier.publish(event(Mode::Healthcheck)), Ok(1));
        notifier.publish(event(Mode::Online)).unwrap();

        assert_eq!(rx.recv().await.unwrap().mode, Mode::Healthcheck);
        assert_eq!(rx.recv().await.unwrap().mode, Mode::Online);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_does_not_block_publisher() {
        let notifier = ModeNotifier::new();
        let mut rx = notifier.subscribe();

        for _ in 0..(EVENT_BUFFER + 4) {
            notifier.publish(event(Mode::Online)).unwrap();
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(4))
        ));
    }

    #[tokio::test]
    async fn test_on_change_invokes_callback() {
        let notifier = ModeNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = notifier.on_change(move |event| {
            let sink = sink.clone();
            async move {
                sink.lock().await.push(event.mode);
            }
        });

        notifier.publish(event(Mode::Healthcheck)).unwrap();
        notifier.publish(event(Mode::Online)).unwrap();
        drop(notifier);
        handle.await.unwrap();

        assert_eq!(*seen.lock().await, vec![Mode::Healthcheck, Mode::Online]);
    }
}
