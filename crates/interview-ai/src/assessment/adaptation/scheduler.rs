use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::super::domain::SessionId;
use super::super::events::{publish_all, AdaptationEvent, EventPublisher};
use super::MonitorKind;

/// Session-side hook invoked by every scheduled tick.
pub trait MonitorTarget: Send + 'static {
    fn on_tick(&mut self, kind: MonitorKind, now: DateTime<Utc>) -> Vec<AdaptationEvent>;
}

struct SessionMonitors {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl SessionMonitors {
    fn shutdown(self) {
        self.token.cancel();
        for handle in self.handles {
            handle.abort();
        }
    }
}

/// Registry of periodic monitors, keyed by session id and torn down together.
pub struct AdaptationScheduler<P: ?Sized> {
    publisher: Arc<P>,
    monitors: Mutex<HashMap<SessionId, SessionMonitors>>,
}

impl<P> AdaptationScheduler<P>
where
    P: EventPublisher + ?Sized + 'static,
{
    pub fn new(publisher: Arc<P>) -> Self {
        Self {
            publisher,
            monitors: Mutex::new(HashMap::new()),
        }
    }

    /// Spawn one task per monitor kind. Must be called from within a Tokio runtime.
    pub fn spawn<T>(
        &self,
        session_id: SessionId,
        target: Arc<tokio::sync::Mutex<T>>,
        schedule: &[(MonitorKind, Duration)],
    ) where
        T: MonitorTarget,
    {
        let token = CancellationToken::new();
        let handles = schedule
            .iter()
            .map(|(kind, period)| {
                tokio::spawn(run_monitor(
                    session_id.clone(),
                    *kind,
                    *period,
                    Arc::clone(&target),
                    Arc::clone(&self.publisher),
                    token.clone(),
                ))
            })
            .collect();

        let replaced = self
            .monitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id, SessionMonitors { token, handles });
        if let Some(previous) = replaced {
            previous.shutdown();
        }
    }

    /// Cancel every monitor of the session; returns whether any were registered.
    pub fn cancel(&self, session_id: &SessionId) -> bool {
        let removed = self
            .monitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
        match removed {
            Some(monitors) => {
                monitors.shutdown();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, session_id: &SessionId) -> bool {
        self.monitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(session_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.monitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<P: ?Sized> Drop for AdaptationScheduler<P> {
    fn drop(&mut self) {
        let monitors = std::mem::take(
            self.monitors
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for (_, session) in monitors {
            session.shutdown();
        }
    }
}

async fn run_monitor<T, P>(
    session_id: SessionId,
    kind: MonitorKind,
    period: Duration,
    target: Arc<tokio::sync::Mutex<T>>,
    publisher: Arc<P>,
    token: CancellationToken,
) where
    T: MonitorTarget,
    P: EventPublisher + ?Sized,
{
    let period = period.max(Duration::from_millis(1));
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = timer.tick() => {}
        }

        // Ticks serialize on the session lock; emission completes before it is released.
        let mut session = target.lock().await;
        if token.is_cancelled() {
            break;
        }
        let events = session.on_tick(kind, Utc::now());
        publish_all(publisher.as_ref(), &session_id, &events);
    }

    debug!(session = %session_id, ?kind, "adaptation monitor stopped");
}
