use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::SessionId;

/// Named condition whose breach produces an adaptation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationTrigger {
    ScoreSignificantChange,
    AttentionLow,
    EngagementLow,
    StressHigh,
    PerformanceDecline,
}

impl AdaptationTrigger {
    pub fn label(&self) -> &'static str {
        match self {
            AdaptationTrigger::ScoreSignificantChange => "score_significant_change",
            AdaptationTrigger::AttentionLow => "attention_low",
            AdaptationTrigger::EngagementLow => "engagement_low",
            AdaptationTrigger::StressHigh => "stress_high",
            AdaptationTrigger::PerformanceDecline => "performance_decline",
        }
    }

    /// UI response recommended for the trigger.
    pub fn recommended_action(&self) -> AdaptationAction {
        match self {
            AdaptationTrigger::ScoreSignificantChange => AdaptationAction::AdjustDifficulty,
            AdaptationTrigger::AttentionLow => AdaptationAction::RefocusPrompt,
            AdaptationTrigger::EngagementLow => AdaptationAction::InteractivePrompt,
            AdaptationTrigger::StressHigh => AdaptationAction::CalmingGuidance,
            AdaptationTrigger::PerformanceDecline => AdaptationAction::OfferEncouragement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationAction {
    AdjustDifficulty,
    RefocusPrompt,
    InteractivePrompt,
    CalmingGuidance,
    OfferEncouragement,
}

/// Threshold breach detected by the adaptation loop, not yet sequenced.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationSignal {
    pub trigger: AdaptationTrigger,
    pub payload: Value,
}

/// UI-facing notification that session telemetry crossed a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationEvent {
    pub sequence: u64,
    pub trigger: AdaptationTrigger,
    pub action: AdaptationAction,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

/// Pending queue consumed once by the UI plus the full audit trail.
#[derive(Debug, Default)]
pub struct EventLog {
    next_sequence: u64,
    pending: VecDeque<AdaptationEvent>,
    audit: Vec<AdaptationEvent>,
}

impl EventLog {
    pub fn emit(&mut self, signal: AdaptationSignal, now: DateTime<Utc>) -> AdaptationEvent {
        self.next_sequence += 1;
        let event = AdaptationEvent {
            sequence: self.next_sequence,
            trigger: signal.trigger,
            action: signal.trigger.recommended_action(),
            payload: signal.payload,
            timestamp: now,
        };
        self.pending.push_back(event.clone());
        self.audit.push(event.clone());
        event
    }

    pub fn drain_pending(&mut self) -> Vec<AdaptationEvent> {
        self.pending.drain(..).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn audit(&self) -> &[AdaptationEvent] {
        &self.audit
    }
}

/// Push-side delivery of adaptation events (websocket bridges, queues, logs).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, session_id: &SessionId, event: &AdaptationEvent) -> Result<(), PublishError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// Publisher that only records events in the trace log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish(&self, session_id: &SessionId, event: &AdaptationEvent) -> Result<(), PublishError> {
        tracing::info!(
            session = %session_id,
            sequence = event.sequence,
            trigger = event.trigger.label(),
            "adaptation event emitted"
        );
        Ok(())
    }
}

/// Hand events to the publisher; delivery failures are logged, never fatal.
pub(crate) fn publish_all<P>(publisher: &P, session_id: &SessionId, events: &[AdaptationEvent])
where
    P: EventPublisher + ?Sized,
{
    for event in events {
        if let Err(err) = publisher.publish(session_id, event) {
            tracing::warn!(session = %session_id, sequence = event.sequence, %err, "failed to publish adaptation event");
        }
    }
}
