use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::assessment::{
    assessment_router, AdaptationEvent, AnalysisProvider, AnalysisRequest, CandidateProfile,
    Channel, ChannelAssessment, EngineConfig, EventPublisher, ExternalAnalysis,
    InterviewAssessmentService, ModalityScore, OfflineProvider, ProviderError, PublishError,
    SessionId,
};

pub(super) fn candidate() -> CandidateProfile {
    CandidateProfile {
        candidate_name: "Li Wei".to_string(),
        domain: "ai".to_string(),
        position: "Machine Learning Engineer".to_string(),
    }
}

pub(super) fn score(channel: Channel, value: f64) -> ModalityScore {
    ModalityScore::new(channel, value)
}

/// Config with external analysis switched on and a single, fast attempt.
pub(super) fn external_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.external.enabled = true;
    config.external.max_attempts = 1;
    config.external.timeout_secs = 1;
    config
}

pub(super) fn build_service() -> (
    InterviewAssessmentService<OfflineProvider, RecordingPublisher>,
    Arc<RecordingPublisher>,
) {
    build_service_with(OfflineProvider, EngineConfig::default())
}

pub(super) fn build_service_with<P>(
    provider: P,
    config: EngineConfig,
) -> (
    InterviewAssessmentService<P, RecordingPublisher>,
    Arc<RecordingPublisher>,
)
where
    P: AnalysisProvider + 'static,
{
    let publisher = Arc::new(RecordingPublisher::default());
    let service = InterviewAssessmentService::new(Arc::new(provider), publisher.clone(), config);
    (service, publisher)
}

#[derive(Default, Clone)]
pub(super) struct RecordingPublisher {
    events: Arc<Mutex<Vec<(SessionId, AdaptationEvent)>>>,
}

impl RecordingPublisher {
    pub(super) fn events(&self) -> Vec<(SessionId, AdaptationEvent)> {
        self.events.lock().expect("publisher mutex poisoned").clone()
    }

    pub(super) fn len(&self) -> usize {
        self.events.lock().expect("publisher mutex poisoned").len()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, session_id: &SessionId, event: &AdaptationEvent) -> Result<(), PublishError> {
        self.events
            .lock()
            .expect("publisher mutex poisoned")
            .push((session_id.clone(), event.clone()));
        Ok(())
    }
}

/// Returns the queued text scores in order, then fails.
#[derive(Default)]
pub(super) struct ScriptedProvider {
    scores: Mutex<VecDeque<f64>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    pub(super) fn new(scores: &[f64]) -> Self {
        Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            calls: AtomicU32::new(0),
        }
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<ExternalAnalysis, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.scores.lock().expect("script mutex poisoned").pop_front();
        match next {
            Some(value) => {
                let mut channels = BTreeMap::new();
                channels.insert(
                    Channel::Text,
                    ChannelAssessment {
                        score: value,
                        metrics: BTreeMap::new(),
                    },
                );
                Ok(ExternalAnalysis { channels })
            }
            None => Err(ProviderError::Unavailable("script exhausted".to_string())),
        }
    }
}

/// Same score for every call; counts how often it was reached.
pub(super) struct CountingProvider {
    score: f64,
    calls: AtomicU32,
}

impl CountingProvider {
    pub(super) fn new(score: f64) -> Self {
        Self {
            score,
            calls: AtomicU32::new(0),
        }
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProvider for CountingProvider {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<ExternalAnalysis, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut channels = BTreeMap::new();
        channels.insert(
            Channel::Text,
            ChannelAssessment {
                score: self.score,
                metrics: BTreeMap::new(),
            },
        );
        Ok(ExternalAnalysis { channels })
    }
}

pub(super) struct StalledProvider;

#[async_trait]
impl AnalysisProvider for StalledProvider {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<ExternalAnalysis, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ExternalAnalysis::default())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(
    service: InterviewAssessmentService<OfflineProvider, RecordingPublisher>,
) -> axum::Router {
    assessment_router(Arc::new(service))
}
