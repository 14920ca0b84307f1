use interview_ai::assessment::{AdaptationEvent, EventPublisher, PublishError, SessionId};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

const RETAINED_EVENTS: usize = 1024;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps the most recent adaptation events for inspection and mirrors each into the trace log.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEventPublisher {
    events: Arc<Mutex<VecDeque<(SessionId, AdaptationEvent)>>>,
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, session_id: &SessionId, event: &AdaptationEvent) -> Result<(), PublishError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| PublishError::Transport("event buffer poisoned".to_string()))?;
        if guard.len() == RETAINED_EVENTS {
            guard.pop_front();
        }
        guard.push_back((session_id.clone(), event.clone()));

        tracing::info!(
            session = %session_id,
            sequence = event.sequence,
            trigger = event.trigger.label(),
            "adaptation event published"
        );
        Ok(())
    }
}

impl InMemoryEventPublisher {
    pub(crate) fn events(&self) -> Vec<(SessionId, AdaptationEvent)> {
        self.events
            .lock()
            .map(|guard| guard.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use interview_ai::assessment::{AdaptationAction, AdaptationTrigger};
    use serde_json::json;

    fn event(sequence: u64) -> AdaptationEvent {
        AdaptationEvent {
            sequence,
            trigger: AdaptationTrigger::AttentionLow,
            action: AdaptationAction::RefocusPrompt,
            payload: json!({ "attention": 0.4 }),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn retains_only_the_most_recent_events() {
        let publisher = InMemoryEventPublisher::default();
        let session = SessionId("sess-buffer".to_string());

        for sequence in 1..=(RETAINED_EVENTS as u64 + 2) {
            publisher.publish(&session, &event(sequence)).expect("publish");
        }

        let events = publisher.events();
        assert_eq!(events.len(), RETAINED_EVENTS);
        assert_eq!(events[0].1.sequence, 3);
    }
}
