//! Threshold-driven adaptation loop for a single interview session.
//!
//! The loop is a small state machine (`idle -> monitoring -> adapting -> monitoring ... ->
//! stopped`). Every observation compares the latest score and realtime signals against the
//! configured thresholds and yields at most one signal per breached trigger.

mod scheduler;

pub use scheduler::{AdaptationScheduler, MonitorTarget};

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::events::{AdaptationSignal, AdaptationTrigger};

/// Thresholds and monitor cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationConfig {
    /// Relative score change that counts as significant (0.10 = 10%).
    pub score_change_ratio: f64,
    pub attention_threshold: f64,
    pub engagement_threshold: f64,
    /// Number of consecutive declining scores that form a decline.
    pub decline_window: usize,
    pub performance_interval_secs: u64,
    pub behavior_interval_secs: u64,
}

impl AdaptationConfig {
    pub fn schedule(&self) -> Vec<(MonitorKind, Duration)> {
        vec![
            (
                MonitorKind::Performance,
                Duration::from_secs(self.performance_interval_secs.max(1)),
            ),
            (
                MonitorKind::Behavior,
                Duration::from_secs(self.behavior_interval_secs.max(1)),
            ),
        ]
    }
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            score_change_ratio: 0.10,
            attention_threshold: 0.7,
            engagement_threshold: 0.8,
            decline_window: 3,
            performance_interval_secs: 5,
            behavior_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

/// Realtime telemetry pushed by the client (attention and engagement in 0.0-1.0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealtimeSignals {
    #[serde(default)]
    pub attention: Option<f64>,
    #[serde(default)]
    pub engagement: Option<f64>,
    #[serde(default)]
    pub stress: Option<StressLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    Monitoring,
    Adapting,
    Stopped,
}

/// Source of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorKind {
    /// Fast periodic check of score movement and realtime signals.
    Performance,
    /// Slow periodic check of the score trend.
    Behavior,
    /// Event-driven check right after a response is recorded.
    Response,
}

/// Snapshot handed to the loop on each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Observation<'a> {
    pub latest_score: Option<f64>,
    pub score_trend: &'a [f64],
    /// Present only when the client pushed new telemetry since the previous tick.
    pub signals: Option<&'a RealtimeSignals>,
}

#[derive(Debug, Clone)]
pub struct AdaptationLoop {
    config: AdaptationConfig,
    state: LoopState,
    score_baseline: Option<f64>,
    reported_decline_at: Option<usize>,
}

impl AdaptationLoop {
    pub fn new(config: AdaptationConfig) -> Self {
        Self {
            config,
            state: LoopState::Idle,
            score_baseline: None,
            reported_decline_at: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Idle {
            self.state = LoopState::Monitoring;
        }
    }

    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    /// Return to monitoring once the tick's events have been delivered.
    pub fn settle(&mut self) {
        if self.state == LoopState::Adapting {
            self.state = LoopState::Monitoring;
        }
    }

    pub fn observe(
        &mut self,
        kind: MonitorKind,
        observation: &Observation<'_>,
    ) -> Vec<AdaptationSignal> {
        if self.state != LoopState::Monitoring {
            return Vec::new();
        }

        let mut breaches = Breaches::default();
        match kind {
            MonitorKind::Response => {
                self.check_score_change(observation.latest_score, &mut breaches);
                self.check_decline(observation.score_trend, &mut breaches);
            }
            MonitorKind::Performance => {
                self.check_score_change(observation.latest_score, &mut breaches);
                if let Some(signals) = observation.signals {
                    self.check_signals(signals, &mut breaches);
                }
            }
            MonitorKind::Behavior => {
                self.check_decline(observation.score_trend, &mut breaches);
            }
        }

        if !breaches.signals.is_empty() {
            self.state = LoopState::Adapting;
        }
        breaches.signals
    }

    fn check_score_change(&mut self, latest: Option<f64>, breaches: &mut Breaches) {
        let Some(current) = latest else {
            return;
        };

        if let Some(previous) = self.score_baseline {
            let change_ratio = (current - previous).abs() / previous.abs().max(1.0);
            if change_ratio > self.config.score_change_ratio {
                let direction = if current > previous { "up" } else { "down" };
                breaches.push(
                    AdaptationTrigger::ScoreSignificantChange,
                    json!({
                        "previous": previous,
                        "current": current,
                        "change_ratio": change_ratio,
                        "direction": direction,
                    }),
                );
            }
        }
        self.score_baseline = Some(current);
    }

    fn check_signals(&self, signals: &RealtimeSignals, breaches: &mut Breaches) {
        if let Some(attention) = signals.attention {
            if attention < self.config.attention_threshold {
                breaches.push(
                    AdaptationTrigger::AttentionLow,
                    json!({ "attention": attention, "threshold": self.config.attention_threshold }),
                );
            }
        }

        if let Some(engagement) = signals.engagement {
            if engagement < self.config.engagement_threshold {
                breaches.push(
                    AdaptationTrigger::EngagementLow,
                    json!({ "engagement": engagement, "threshold": self.config.engagement_threshold }),
                );
            }
        }

        if signals.stress == Some(StressLevel::High) {
            breaches.push(AdaptationTrigger::StressHigh, json!({ "stress": "high" }));
        }
    }

    fn check_decline(&mut self, trend: &[f64], breaches: &mut Breaches) {
        let window = self.config.decline_window;
        if window < 2 || trend.len() < window || self.reported_decline_at == Some(trend.len()) {
            return;
        }

        let recent = &trend[trend.len() - window..];
        if recent.windows(2).all(|pair| pair[1] < pair[0]) {
            self.reported_decline_at = Some(trend.len());
            breaches.push(
                AdaptationTrigger::PerformanceDecline,
                json!({ "recent_scores": recent }),
            );
        }
    }
}

/// Signals raised within one tick; a trigger is recorded at most once.
#[derive(Default)]
struct Breaches {
    seen: BTreeSet<AdaptationTrigger>,
    signals: Vec<AdaptationSignal>,
}

impl Breaches {
    fn push(&mut self, trigger: AdaptationTrigger, payload: serde_json::Value) {
        if self.seen.insert(trigger) {
            self.signals.push(AdaptationSignal { trigger, payload });
        }
    }
}
