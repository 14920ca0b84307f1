use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::adaptation::{
    AdaptationLoop, AdaptationScheduler, MonitorKind, MonitorTarget, Observation, RealtimeSignals,
};
use super::cache::{fingerprint, CacheKey, ResultCache};
use super::classifier::{DimensionProfile, ResponseDimensionClassifier};
use super::domain::{
    CandidateProfile, Channel, InterviewMode, InterviewSession, ModalityScore, ResponseRecord,
    SessionId, SessionStatus,
};
use super::events::{publish_all, AdaptationEvent, EventLog, EventPublisher};
use super::external::{call_external_analysis, AnalysisProvider, AnalysisRequest, ExternalOutcome};
use super::fusion::{metrics, FusedScore, ScoreFusion, VideoFeatures, VoiceFeatures};
use super::hints::{Hint, HintStrategySelector};
use super::session::{SessionState, SessionStateError, SessionSummary};
use super::EngineConfig;

/// Candidate answer submitted for scoring. Text alone is always a valid request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub question: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub audio_ref: Option<String>,
    #[serde(default)]
    pub video_ref: Option<String>,
    #[serde(default)]
    pub voice_features: Option<VoiceFeatures>,
    #[serde(default)]
    pub video_features: Option<VideoFeatures>,
}

impl AnalyzeRequest {
    pub fn text_only(question: &str, text: &str) -> Self {
        Self {
            question: question.to_string(),
            text: text.to_string(),
            ..Self::default()
        }
    }

    /// True when no channel carries any input at all.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
            && self.audio_ref.is_none()
            && self.video_ref.is_none()
            && self.voice_features.is_none()
            && self.video_features.is_none()
    }

    fn fingerprint(&self, domain: &str) -> String {
        let voice = self
            .voice_features
            .as_ref()
            .and_then(|features| serde_json::to_string(features).ok())
            .unwrap_or_default();
        let video = self
            .video_features
            .as_ref()
            .and_then(|features| serde_json::to_string(features).ok())
            .unwrap_or_default();

        fingerprint(&[
            domain,
            self.question.as_str(),
            self.text.as_str(),
            self.audio_ref.as_deref().unwrap_or_default(),
            self.video_ref.as_deref().unwrap_or_default(),
            voice.as_str(),
            video.as_str(),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintRequest {
    pub question: String,
    pub response: String,
    #[serde(default)]
    pub question_number: Option<u32>,
}

/// Outcome of AnalyzeResponse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseAssessment {
    pub session_id: SessionId,
    pub question_number: u32,
    pub fused_score: FusedScore,
    pub dimensions: DimensionProfile,
    pub modality_scores: BTreeMap<Channel, ModalityScore>,
    /// Adaptation events waiting to be pulled, including any raised by this response.
    pub pending_events: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    #[error("session {0} is paused")]
    SessionPaused(SessionId),
    #[error(transparent)]
    Session(#[from] SessionStateError),
}

#[derive(Debug, Clone)]
struct CachedAnalysis {
    dimensions: DimensionProfile,
    modality_scores: BTreeMap<Channel, ModalityScore>,
}

impl CachedAnalysis {
    fn is_degraded(&self) -> bool {
        self.modality_scores.values().any(|score| score.degraded)
    }
}

/// Everything owned by one running session; guarded by a single async lock.
struct LiveSession {
    state: SessionState,
    monitor: AdaptationLoop,
    events: EventLog,
    signals: Option<RealtimeSignals>,
    signals_revision: u64,
    observed_revision: u64,
}

impl LiveSession {
    fn observe(&mut self, kind: MonitorKind, now: DateTime<Utc>) -> Vec<AdaptationEvent> {
        if self.state.status() != SessionStatus::Active {
            return Vec::new();
        }

        let trend = self.state.score_trend();
        let fresh_signals = kind == MonitorKind::Performance
            && self.signals_revision != self.observed_revision;
        let observation = Observation {
            latest_score: self.state.current_score().map(|score| score.overall_score),
            score_trend: &trend,
            signals: if fresh_signals {
                self.signals.as_ref()
            } else {
                None
            },
        };

        let raised = self.monitor.observe(kind, &observation);
        if kind == MonitorKind::Performance {
            self.observed_revision = self.signals_revision;
        }

        let events = raised
            .into_iter()
            .map(|signal| self.events.emit(signal, now))
            .collect();
        self.monitor.settle();
        events
    }

    fn terminate(&mut self, status: SessionStatus) -> Result<SessionSummary, SessionStateError> {
        match status {
            SessionStatus::Cancelled => self.state.cancel()?,
            _ => self.state.complete()?,
        }
        self.monitor.stop();
        Ok(self.state.summary())
    }

    fn ensure_accepting(&self) -> Result<(), AssessmentServiceError> {
        let status = self.state.status();
        if status.is_terminal() {
            return Err(SessionStateError::Terminated {
                session_id: self.state.id().clone(),
                status,
            }
            .into());
        }
        Ok(())
    }
}

impl MonitorTarget for LiveSession {
    fn on_tick(&mut self, kind: MonitorKind, now: DateTime<Utc>) -> Vec<AdaptationEvent> {
        self.observe(kind, now)
    }
}

type SessionHandle = Arc<tokio::sync::Mutex<LiveSession>>;

/// Facade composing fusion, classification, hint selection, session state, and adaptation.
pub struct InterviewAssessmentService<P, E> {
    config: EngineConfig,
    fusion: ScoreFusion,
    classifier: ResponseDimensionClassifier,
    selector: HintStrategySelector,
    provider: Arc<P>,
    publisher: Arc<E>,
    scheduler: AdaptationScheduler<E>,
    sessions: Mutex<HashMap<SessionId, SessionHandle>>,
    /// Ended sessions in the order they ended.
    retired: Mutex<VecDeque<(SessionId, Instant)>>,
    analysis_cache: ResultCache<CachedAnalysis>,
    hint_cache: ResultCache<Hint>,
}

impl<P, E> InterviewAssessmentService<P, E>
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(provider: Arc<P>, publisher: Arc<E>, config: EngineConfig) -> Self {
        Self {
            fusion: ScoreFusion::new(config.fusion.clone()),
            classifier: ResponseDimensionClassifier::new(config.classifier.clone()),
            selector: HintStrategySelector::new(),
            scheduler: AdaptationScheduler::new(Arc::clone(&publisher)),
            sessions: Mutex::new(HashMap::new()),
            retired: Mutex::new(VecDeque::new()),
            analysis_cache: ResultCache::new(&config.cache),
            hint_cache: ResultCache::new(&config.cache),
            provider,
            publisher,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open a session and start its adaptation monitors. Requires a Tokio runtime.
    pub fn start_session(&self, candidate: CandidateProfile, mode: InterviewMode) -> SessionId {
        let session_id = SessionId::generate();
        let domain = candidate.domain.clone();
        let session = InterviewSession::open(session_id.clone(), candidate, mode, Utc::now());

        let mut monitor = AdaptationLoop::new(self.config.adaptation.clone());
        monitor.start();

        let handle = Arc::new(tokio::sync::Mutex::new(LiveSession {
            state: SessionState::new(session, self.fusion.clone()),
            monitor,
            events: EventLog::default(),
            signals: None,
            signals_revision: 0,
            observed_revision: 0,
        }));

        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.clone(), Arc::clone(&handle));
        self.scheduler
            .spawn(session_id.clone(), handle, &self.config.adaptation.schedule());

        info!(session = %session_id, %domain, ?mode, "interview session started");
        session_id
    }

    /// Score one answer, append it to the session, and run the response-driven observation.
    ///
    /// The session lock is held across scoring, including any external analysis call, so
    /// answers are recorded strictly in arrival order. Other operations on the same session
    /// wait up to `max_attempts` timeouts plus backoff while a provider call is in flight.
    pub async fn analyze_response(
        &self,
        session_id: &SessionId,
        request: AnalyzeRequest,
    ) -> Result<ResponseAssessment, AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let mut live = handle.lock().await;
        live.ensure_accepting()?;
        if live.state.status() == SessionStatus::Paused {
            return Err(AssessmentServiceError::SessionPaused(session_id.clone()));
        }

        let domain = live.state.session().domain.clone();
        let key = CacheKey::new(session_id, request.fingerprint(&domain));
        let analysis = match self.analysis_cache.get(&key) {
            Some(cached) => cached,
            None => {
                let computed = self.assess(session_id, &domain, &request).await;
                if !computed.is_degraded() {
                    self.analysis_cache.insert(key, computed.clone());
                }
                computed
            }
        };

        let question_number = live.state.next_question_number();
        let now = Utc::now();
        let fused_score = live.state.record(ResponseRecord {
            question_number,
            question: request.question,
            raw_text: request.text,
            audio_ref: request.audio_ref,
            video_ref: request.video_ref,
            modality_scores: analysis.modality_scores.clone(),
            dimensions: analysis.dimensions.clone(),
            timestamp: now,
        })?;

        let events = live.observe(MonitorKind::Response, now);
        publish_all(self.publisher.as_ref(), session_id, &events);

        Ok(ResponseAssessment {
            session_id: session_id.clone(),
            question_number,
            fused_score,
            dimensions: analysis.dimensions,
            modality_scores: analysis.modality_scores,
            pending_events: live.events.pending_len(),
        })
    }

    /// Classify the in-progress answer and return the hint for it.
    pub async fn get_hint(
        &self,
        session_id: &SessionId,
        request: HintRequest,
    ) -> Result<Hint, AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let mut live = handle.lock().await;
        live.ensure_accepting()?;

        let question_number = request
            .question_number
            .unwrap_or_else(|| live.state.next_question_number());
        let domain = live.state.session().domain.clone();
        let key = CacheKey::new(
            session_id,
            fingerprint(&[
                domain.as_str(),
                request.question.as_str(),
                request.response.as_str(),
                question_number.to_string().as_str(),
            ]),
        );

        let hint = match self.hint_cache.get(&key) {
            Some(cached) => cached,
            None => {
                let profile =
                    self.classifier
                        .classify(&request.question, &request.response, Some(&domain));
                let hint = self.selector.select_hint(&profile, question_number);
                self.hint_cache.insert(key, hint.clone());
                hint
            }
        };

        live.state.record_hint(hint.clone())?;
        Ok(hint)
    }

    /// Store the latest client telemetry; the next performance tick evaluates it.
    pub async fn update_signals(
        &self,
        session_id: &SessionId,
        signals: RealtimeSignals,
    ) -> Result<(), AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let mut live = handle.lock().await;
        live.ensure_accepting()?;
        live.signals = Some(signals);
        live.signals_revision += 1;
        Ok(())
    }

    /// Drain events not yet delivered; each event is returned once.
    pub async fn adaptation_events(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<AdaptationEvent>, AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let mut live = handle.lock().await;
        Ok(live.events.drain_pending())
    }

    pub async fn audit_log(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<AdaptationEvent>, AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let live = handle.lock().await;
        Ok(live.events.audit().to_vec())
    }

    pub async fn pause_session(&self, session_id: &SessionId) -> Result<(), AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let mut live = handle.lock().await;
        live.state.pause()?;
        Ok(())
    }

    pub async fn resume_session(&self, session_id: &SessionId) -> Result<(), AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let mut live = handle.lock().await;
        live.state.resume()?;
        Ok(())
    }

    /// Complete the session, freeze its state, and cancel its monitors.
    pub async fn end_session(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionSummary, AssessmentServiceError> {
        self.finish(session_id, SessionStatus::Completed).await
    }

    pub async fn cancel_session(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionSummary, AssessmentServiceError> {
        self.finish(session_id, SessionStatus::Cancelled).await
    }

    pub async fn session_summary(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionSummary, AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let live = handle.lock().await;
        Ok(live.state.summary())
    }

    pub async fn session_snapshot(
        &self,
        session_id: &SessionId,
    ) -> Result<InterviewSession, AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let live = handle.lock().await;
        Ok(live.state.session().clone())
    }

    /// Number of sessions with live adaptation monitors.
    pub fn active_monitors(&self) -> usize {
        self.scheduler.active_sessions()
    }

    async fn finish(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<SessionSummary, AssessmentServiceError> {
        let handle = self.handle(session_id)?;
        let mut live = handle.lock().await;
        let summary = live.terminate(status)?;
        // Monitors are torn down inside the termination critical section.
        self.scheduler.cancel(session_id);
        drop(live);

        self.analysis_cache.invalidate_session(session_id);
        self.hint_cache.invalidate_session(session_id);
        self.retire(session_id);
        info!(
            session = %session_id,
            status = status.label(),
            responses = summary.responses,
            "interview session ended"
        );
        Ok(summary)
    }

    async fn assess(
        &self,
        session_id: &SessionId,
        domain: &str,
        request: &AnalyzeRequest,
    ) -> CachedAnalysis {
        let dimensions = self
            .classifier
            .classify(&request.question, &request.text, Some(domain));

        let mut modality_scores = BTreeMap::new();
        let has_media_features =
            request.voice_features.is_some() || request.video_features.is_some();
        if !request.text.trim().is_empty() || !has_media_features {
            modality_scores.insert(
                Channel::Text,
                metrics::text_score(
                    &request.question,
                    &request.text,
                    &dimensions,
                    self.classifier.config(),
                ),
            );
        }
        if let Some(features) = &request.voice_features {
            modality_scores.insert(Channel::Voice, metrics::voice_score(features));
        }
        if let Some(features) = &request.video_features {
            modality_scores.insert(Channel::Video, metrics::video_score(features));
        }

        if self.config.external.enabled {
            let analysis_request = AnalysisRequest {
                session_id: session_id.clone(),
                question: request.question.clone(),
                text: request.text.clone(),
                audio_ref: request.audio_ref.clone(),
                video_ref: request.video_ref.clone(),
            };

            match call_external_analysis(
                self.provider.as_ref(),
                &analysis_request,
                &self.config.external,
            )
            .await
            {
                ExternalOutcome::Completed(analysis) => {
                    for (channel, assessment) in analysis.channels {
                        modality_scores.insert(
                            channel,
                            ModalityScore {
                                channel,
                                weight: 0.0,
                                score: assessment.score,
                                metrics: assessment.metrics,
                                degraded: false,
                            },
                        );
                    }
                }
                outcome @ (ExternalOutcome::TimedOut | ExternalOutcome::Failed(_)) => {
                    warn!(
                        session = %session_id,
                        ?outcome,
                        "external analysis unavailable, using heuristic scores"
                    );
                    for channel in analysis_request.requested_channels() {
                        if let Some(score) = modality_scores.get_mut(&channel) {
                            score.degraded = true;
                        }
                    }
                }
            }
        }

        let channels: Vec<Channel> = modality_scores.keys().copied().collect();
        let weights = self.fusion.effective_weights(&channels);
        for (channel, score) in modality_scores.iter_mut() {
            score.weight = weights.get(channel).copied().unwrap_or_default();
        }

        CachedAnalysis {
            dimensions,
            modality_scores,
        }
    }

    /// Ended sessions stay readable until they outlive the retention window or the cap.
    fn retire(&self, session_id: &SessionId) {
        let now = Instant::now();
        self.retired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((session_id.clone(), now));
        self.evict_retired(now);
    }

    fn evict_retired(&self, now: Instant) {
        let retention = &self.config.retention;
        let mut evicted = Vec::new();
        {
            let mut retired = self.retired.lock().unwrap_or_else(PoisonError::into_inner);
            while let Some(&(_, ended_at)) = retired.front() {
                let over_cap = retired.len() > retention.max_retained;
                if !over_cap && now.duration_since(ended_at) < retention.ttl() {
                    break;
                }
                if let Some((session_id, _)) = retired.pop_front() {
                    evicted.push(session_id);
                }
            }
        }
        if evicted.is_empty() {
            return;
        }

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        for session_id in &evicted {
            sessions.remove(session_id);
        }
        debug!(evicted = evicted.len(), "ended interview sessions evicted");
    }

    fn handle(&self, session_id: &SessionId) -> Result<SessionHandle, AssessmentServiceError> {
        self.evict_retired(Instant::now());
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .ok_or_else(|| AssessmentServiceError::UnknownSession(session_id.clone()))
    }
}
