//! Session-scoped multimodal scoring and adaptive hint engine.
//!
//! Answers flow through [`ScoreFusion`] and [`ResponseDimensionClassifier`], the resulting
//! profile selects a [`Hint`], every scored response is appended to the owning
//! [`SessionState`], and an [`AdaptationLoop`] per session watches scores and realtime
//! telemetry to emit [`AdaptationEvent`]s for the UI.

pub mod adaptation;
pub mod cache;
pub mod classifier;
pub mod domain;
pub mod events;
pub mod external;
pub mod fusion;
pub mod hints;
pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use adaptation::{
    AdaptationConfig, AdaptationLoop, LoopState, MonitorKind, Observation, RealtimeSignals,
    StressLevel,
};
pub use cache::{CacheConfig, CacheKey, ResultCache};
pub use classifier::{
    AnswerQuality, ClassifierConfig, DimensionProfile, QuestionType, ResponseDimensionClassifier,
    ResponsePattern, TechnicalDomain,
};
pub use domain::{
    CandidateProfile, Channel, InterviewMode, InterviewSession, ModalityScore, ResponseRecord,
    SessionId, SessionStatus,
};
pub use events::{
    AdaptationAction, AdaptationEvent, AdaptationTrigger, EventPublisher, PublishError,
    TracingPublisher,
};
pub use external::{
    AnalysisProvider, AnalysisRequest, ChannelAssessment, ExternalAnalysis, ExternalCallConfig,
    ExternalOutcome, OfflineProvider, ProviderError,
};
pub use fusion::{FusedScore, FusionConfig, FusionError, ScoreFusion, VideoFeatures, VoiceFeatures};
pub use hints::{Hint, HintStrategySelector, HintTiming, HintType, Urgency};
pub use router::assessment_router;
pub use service::{
    AnalyzeRequest, AssessmentServiceError, HintRequest, InterviewAssessmentService,
    ResponseAssessment,
};
pub use session::{RetentionConfig, SessionState, SessionStateError, SessionSummary};

/// Every tunable of the engine, grouped per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub fusion: FusionConfig,
    pub classifier: ClassifierConfig,
    pub adaptation: AdaptationConfig,
    pub cache: CacheConfig,
    pub external: ExternalCallConfig,
    pub retention: RetentionConfig,
}
