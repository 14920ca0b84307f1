use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::adaptation::RealtimeSignals;
use super::domain::{CandidateProfile, InterviewMode, SessionId};
use super::events::EventPublisher;
use super::external::AnalysisProvider;
use super::service::{
    AnalyzeRequest, AssessmentServiceError, HintRequest, InterviewAssessmentService,
};
use super::session::SessionStateError;

type SharedService<P, E> = Arc<InterviewAssessmentService<P, E>>;

/// Request body for opening a session.
#[derive(Debug, Deserialize)]
pub(crate) struct StartSessionRequest {
    #[serde(flatten)]
    candidate: CandidateProfile,
    #[serde(default)]
    mode: InterviewMode,
}

/// Router builder exposing the interview session endpoints.
pub fn assessment_router<P, E>(service: SharedService<P, E>) -> Router
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/interview/sessions",
            post(start_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id",
            get(summary_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id/responses",
            post(analyze_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id/hints",
            post(hint_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id/signals",
            post(signals_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id/events",
            get(events_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id/pause",
            post(pause_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id/resume",
            post(resume_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id/end",
            post(end_handler::<P, E>),
        )
        .route(
            "/api/v1/interview/sessions/:session_id/cancel",
            post(cancel_handler::<P, E>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    axum::Json(request): axum::Json<StartSessionRequest>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    let session_id = service.start_session(request.candidate, request.mode);
    let payload = json!({
        "session_id": session_id,
        "status": "active",
    });
    (StatusCode::CREATED, axum::Json(payload)).into_response()
}

/// Blank text is scored by the engine as an `unknown` answer; only a body with no text,
/// audio, or video at all is refused with 422, since there is nothing to record.
pub(crate) async fn analyze_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AnalyzeRequest>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    if request.is_empty() {
        let payload = json!({
            "error": "response carries no text, audio, or video input",
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    match service
        .analyze_response(&SessionId(session_id), request)
        .await
    {
        Ok(assessment) => (StatusCode::OK, axum::Json(assessment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn hint_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<HintRequest>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    match service.get_hint(&SessionId(session_id), request).await {
        Ok(hint) => (StatusCode::OK, axum::Json(hint)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn signals_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
    axum::Json(signals): axum::Json<RealtimeSignals>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    match service
        .update_signals(&SessionId(session_id), signals)
        .await
    {
        Ok(()) => {
            let payload = json!({ "status": "accepted" });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn events_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    let id = SessionId(session_id);
    match service.adaptation_events(&id).await {
        Ok(events) => {
            let payload = json!({
                "session_id": id,
                "events": events,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    match service.session_summary(&SessionId(session_id)).await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn pause_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    let id = SessionId(session_id);
    match service.pause_session(&id).await {
        Ok(()) => status_payload(&id, "paused"),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn resume_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    let id = SessionId(session_id);
    match service.resume_session(&id).await {
        Ok(()) => status_payload(&id, "active"),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn end_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    match service.end_session(&SessionId(session_id)).await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<P, E>(
    State(service): State<SharedService<P, E>>,
    Path(session_id): Path<String>,
) -> Response
where
    P: AnalysisProvider + 'static,
    E: EventPublisher + 'static,
{
    match service.cancel_session(&SessionId(session_id)).await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

fn status_payload(session_id: &SessionId, status: &str) -> Response {
    let payload = json!({
        "session_id": session_id,
        "status": status,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn error_response(error: AssessmentServiceError) -> Response {
    match error {
        AssessmentServiceError::UnknownSession(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        AssessmentServiceError::SessionPaused(_)
        | AssessmentServiceError::Session(SessionStateError::Terminated { .. })
        | AssessmentServiceError::Session(SessionStateError::InvalidTransition { .. }) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        AssessmentServiceError::Session(SessionStateError::Scoring(_)) => {
            tracing::error!(%error, "response scoring failed");
            let payload = json!({ "error": "analysis temporarily unavailable" });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}
