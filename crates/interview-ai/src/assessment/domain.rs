use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::DimensionProfile;
use super::fusion::FusedScore;

/// Identifier wrapper for interview sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(format!("sess-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Independent input channel feeding the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Text,
    Voice,
    Video,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Text, Channel::Voice, Channel::Video];

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Text => "text",
            Channel::Voice => "voice",
            Channel::Video => "video",
        }
    }
}

/// Score contributed by one channel together with the sub-metrics behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityScore {
    pub channel: Channel,
    /// Canonical weight redistributed over the channels present in the same response.
    pub weight: f64,
    pub score: f64,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    /// Set when richer external analysis was requested but the heuristic path was used.
    #[serde(default)]
    pub degraded: bool,
}

impl ModalityScore {
    pub fn new(channel: Channel, score: f64) -> Self {
        Self {
            channel,
            weight: 0.0,
            score,
            metrics: BTreeMap::new(),
            degraded: false,
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }
}

/// Lifecycle of an interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

/// How the interview is being conducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    #[default]
    Practice,
    Formal,
}

/// Candidate descriptor supplied when a session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_name: String,
    pub domain: String,
    pub position: String,
}

/// One scored answer. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub question_number: u32,
    pub question: String,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_ref: Option<String>,
    pub modality_scores: BTreeMap<Channel, ModalityScore>,
    pub dimensions: DimensionProfile,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate state of a candidate's interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: SessionId,
    pub candidate_name: String,
    pub domain: String,
    pub position: String,
    pub mode: InterviewMode,
    pub started_at: DateTime<Utc>,
    pub responses: Vec<ResponseRecord>,
    pub overall_score: Option<FusedScore>,
    pub status: SessionStatus,
}

impl InterviewSession {
    pub fn open(
        id: SessionId,
        candidate: CandidateProfile,
        mode: InterviewMode,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            candidate_name: candidate.candidate_name,
            domain: candidate.domain,
            position: candidate.position,
            mode,
            started_at,
            responses: Vec::new(),
            overall_score: None,
            status: SessionStatus::Active,
        }
    }
}
