use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{Channel, SessionId};

/// Timeout and retry policy for the upstream analysis provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalCallConfig {
    /// Request richer analysis from the provider on every response.
    pub enabled: bool,
    pub timeout_secs: u64,
    /// Total attempts for idempotent calls (1 = no retry).
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl ExternalCallConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for ExternalCallConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 30,
            max_attempts: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// Payload sent to the provider for one candidate answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub session_id: SessionId,
    pub question: String,
    pub text: String,
    pub audio_ref: Option<String>,
    pub video_ref: Option<String>,
}

impl AnalysisRequest {
    /// Channels the provider is expected to assess for this request.
    pub fn requested_channels(&self) -> Vec<Channel> {
        let mut channels = vec![Channel::Text];
        if self.audio_ref.is_some() {
            channels.push(Channel::Voice);
        }
        if self.video_ref.is_some() {
            channels.push(Channel::Video);
        }
        channels
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAssessment {
    pub score: f64,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalAnalysis {
    pub channels: BTreeMap<Channel, ChannelAssessment>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("analysis provider unavailable: {0}")]
    Unavailable(String),
    #[error("analysis provider rejected the request: {0}")]
    Rejected(String),
}

/// Upstream language-model/analysis service. Transport lives with the implementor.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<ExternalAnalysis, ProviderError>;
}

/// Provider used when no upstream service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineProvider;

#[async_trait]
impl AnalysisProvider for OfflineProvider {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<ExternalAnalysis, ProviderError> {
        Err(ProviderError::Unavailable(
            "no analysis provider configured".to_string(),
        ))
    }
}

/// Result of crossing the provider boundary; fallback is an explicit branch on this value.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalOutcome {
    Completed(ExternalAnalysis),
    TimedOut,
    Failed(String),
}

/// Call the provider with a timeout, retrying with backoff up to `max_attempts`.
///
/// Only idempotent, read-like requests go through here. Timeouts and unavailability are
/// retried; a rejection fails immediately.
pub async fn call_external_analysis<P>(
    provider: &P,
    request: &AnalysisRequest,
    config: &ExternalCallConfig,
) -> ExternalOutcome
where
    P: AnalysisProvider + ?Sized,
{
    let attempts = config.max_attempts.max(1);
    let mut outcome = ExternalOutcome::Failed("not attempted".to_string());

    for attempt in 1..=attempts {
        outcome = match tokio::time::timeout(config.timeout(), provider.analyze(request)).await {
            Ok(Ok(analysis)) => return ExternalOutcome::Completed(sanitize(analysis)),
            Ok(Err(err @ ProviderError::Rejected(_))) => {
                warn!(
                    provider = provider.name(),
                    session = %request.session_id,
                    attempt,
                    %err,
                    "external analysis rejected"
                );
                return ExternalOutcome::Failed(err.to_string());
            }
            Ok(Err(err)) => ExternalOutcome::Failed(err.to_string()),
            Err(_) => ExternalOutcome::TimedOut,
        };

        warn!(
            provider = provider.name(),
            session = %request.session_id,
            attempt,
            ?outcome,
            "external analysis attempt failed"
        );

        if attempt < attempts {
            let backoff = config.backoff() * attempt;
            debug!(?backoff, "retrying external analysis");
            tokio::time::sleep(backoff).await;
        }
    }

    outcome
}

/// Drop channel assessments that are not finite; clamp the rest into 0-100.
fn sanitize(mut analysis: ExternalAnalysis) -> ExternalAnalysis {
    analysis
        .channels
        .retain(|_, assessment| assessment.score.is_finite());
    for assessment in analysis.channels.values_mut() {
        assessment.score = assessment.score.clamp(0.0, 100.0);
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            session_id: SessionId("sess-ext".to_string()),
            question: "What is overfitting?".to_string(),
            text: "When a model memorizes noise".to_string(),
            audio_ref: None,
            video_ref: None,
        }
    }

    struct FlakyProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl AnalysisProvider for FlakyProvider {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn analyze(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<ExternalAnalysis, ProviderError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ProviderError::Unavailable("connection reset".to_string()));
            }
            let mut channels = BTreeMap::new();
            channels.insert(
                Channel::Text,
                ChannelAssessment {
                    score: 140.0,
                    metrics: BTreeMap::new(),
                },
            );
            channels.insert(
                Channel::Voice,
                ChannelAssessment {
                    score: f64::NAN,
                    metrics: BTreeMap::new(),
                },
            );
            Ok(ExternalAnalysis { channels })
        }
    }

    struct StalledProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl AnalysisProvider for StalledProvider {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn analyze(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<ExternalAnalysis, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ExternalAnalysis::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_and_sanitizes_scores() {
        let provider = FlakyProvider {
            calls: AtomicU32::new(0),
        };

        let outcome =
            call_external_analysis(&provider, &request(), &ExternalCallConfig::default()).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        match outcome {
            ExternalOutcome::Completed(analysis) => {
                assert_eq!(analysis.channels[&Channel::Text].score, 100.0);
                assert!(!analysis.channels.contains_key(&Channel::Voice));
            }
            other => panic!("expected completed analysis, got {other:?}"),
        }
    }

    struct RejectingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl AnalysisProvider for RejectingProvider {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn analyze(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<ExternalAnalysis, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Rejected("payload too large".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rejections_are_not_retried() {
        let provider = RejectingProvider {
            calls: AtomicU32::new(0),
        };

        let outcome =
            call_external_analysis(&provider, &request(), &ExternalCallConfig::default()).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(outcome, ExternalOutcome::Failed(reason) if reason.contains("rejected")));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_final_attempt() {
        let provider = StalledProvider {
            calls: AtomicU32::new(0),
        };

        let outcome =
            call_external_analysis(&provider, &request(), &ExternalCallConfig::default()).await;

        assert_eq!(outcome, ExternalOutcome::TimedOut);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn offline_provider_fails_without_retry_when_single_attempt() {
        let config = ExternalCallConfig {
            max_attempts: 1,
            ..ExternalCallConfig::default()
        };

        let outcome = call_external_analysis(&OfflineProvider, &request(), &config).await;

        assert!(matches!(outcome, ExternalOutcome::Failed(reason) if reason.contains("no analysis provider")));
    }

    #[test]
    fn requested_channels_follow_media_refs() {
        let mut request = request();
        assert_eq!(request.requested_channels(), vec![Channel::Text]);
        request.video_ref = Some("blob://video/1".to_string());
        assert_eq!(
            request.requested_channels(),
            vec![Channel::Text, Channel::Video]
        );
    }
}
