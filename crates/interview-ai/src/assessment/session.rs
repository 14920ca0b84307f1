use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::classifier::AnswerQuality;
use super::domain::{InterviewSession, ResponseRecord, SessionId, SessionStatus};
use super::fusion::{FusedScore, FusionError, ScoreFusion};
use super::hints::{Hint, HintType};

/// How long ended sessions stay readable before the service forgets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub ttl_secs: u64,
    /// Ended sessions kept at most; the oldest are evicted first.
    pub max_retained: usize,
}

impl RetentionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_retained: 1000,
        }
    }
}

/// Errors raised when mutating a session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionStateError {
    #[error("session {session_id} is {} and no longer accepts changes", .status.label())]
    Terminated {
        session_id: SessionId,
        status: SessionStatus,
    },
    #[error("cannot move session {session_id} from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        session_id: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },
    #[error("response could not be scored: {0}")]
    Scoring(#[from] FusionError),
}

/// Append-only state of one interview, owned by exactly one controller.
///
/// The stored overall score is always the fusion of the latest record's modality scores.
#[derive(Debug, Clone)]
pub struct SessionState {
    session: InterviewSession,
    hints: Vec<Hint>,
    fusion: ScoreFusion,
}

impl SessionState {
    pub fn new(session: InterviewSession, fusion: ScoreFusion) -> Self {
        Self {
            session,
            hints: Vec::new(),
            fusion,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    pub fn next_question_number(&self) -> u32 {
        self.session.responses.len() as u32 + 1
    }

    /// Append a scored response in arrival order.
    pub fn record(&mut self, record: ResponseRecord) -> Result<FusedScore, SessionStateError> {
        self.ensure_open()?;
        let fused = self.fusion.fuse(record.modality_scores.values())?;
        self.session.responses.push(record);
        self.session.overall_score = Some(fused.clone());
        Ok(fused)
    }

    pub fn current_score(&self) -> Option<&FusedScore> {
        self.session.overall_score.as_ref()
    }

    pub fn history(&self) -> &[ResponseRecord] {
        &self.session.responses
    }

    pub fn record_hint(&mut self, hint: Hint) -> Result<(), SessionStateError> {
        self.ensure_open()?;
        self.hints.push(hint);
        Ok(())
    }

    pub fn hints(&self) -> &[Hint] {
        &self.hints
    }

    /// Overall score of every response, oldest first.
    pub fn score_trend(&self) -> Vec<f64> {
        self.session
            .responses
            .iter()
            .filter_map(|record| self.fusion.fuse(record.modality_scores.values()).ok())
            .map(|fused| fused.overall_score)
            .collect()
    }

    pub fn pause(&mut self) -> Result<(), SessionStateError> {
        self.transition(SessionStatus::Active, SessionStatus::Paused)
    }

    pub fn resume(&mut self) -> Result<(), SessionStateError> {
        self.transition(SessionStatus::Paused, SessionStatus::Active)
    }

    pub fn complete(&mut self) -> Result<(), SessionStateError> {
        self.terminate(SessionStatus::Completed)
    }

    pub fn cancel(&mut self) -> Result<(), SessionStateError> {
        self.terminate(SessionStatus::Cancelled)
    }

    pub fn summary(&self) -> SessionSummary {
        let trend = self.score_trend();
        let average_score = if trend.is_empty() {
            None
        } else {
            Some(trend.iter().sum::<f64>() / trend.len() as f64)
        };

        let mut quality_distribution = BTreeMap::new();
        for record in &self.session.responses {
            *quality_distribution
                .entry(record.dimensions.answer_quality)
                .or_insert(0) += 1;
        }

        let mut hints_by_type = BTreeMap::new();
        for hint in &self.hints {
            *hints_by_type.entry(hint.hint_type).or_insert(0) += 1;
        }

        SessionSummary {
            session_id: self.session.id.clone(),
            status: self.session.status,
            responses: self.session.responses.len(),
            average_score,
            latest_score: self.session.overall_score.clone(),
            best_score: trend.iter().copied().reduce(f64::max),
            quality_distribution,
            hints_by_type,
        }
    }

    fn ensure_open(&self) -> Result<(), SessionStateError> {
        if self.session.status.is_terminal() {
            return Err(SessionStateError::Terminated {
                session_id: self.session.id.clone(),
                status: self.session.status,
            });
        }
        Ok(())
    }

    fn transition(
        &mut self,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<(), SessionStateError> {
        self.ensure_open()?;
        if self.session.status != from {
            return Err(SessionStateError::InvalidTransition {
                session_id: self.session.id.clone(),
                from: self.session.status,
                to,
            });
        }
        self.session.status = to;
        Ok(())
    }

    fn terminate(&mut self, to: SessionStatus) -> Result<(), SessionStateError> {
        self.ensure_open()?;
        self.session.status = to;
        Ok(())
    }
}

/// Roll-up returned when a session ends or is inspected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub responses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_score: Option<FusedScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<f64>,
    pub quality_distribution: BTreeMap<AnswerQuality, usize>,
    pub hints_by_type: BTreeMap<HintType, usize>,
}
