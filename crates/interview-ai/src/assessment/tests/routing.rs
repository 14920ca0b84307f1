use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::assessment::router::analyze_handler;
use crate::assessment::{AnalyzeRequest, InterviewMode, OfflineProvider};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn analyze_handler_rejects_empty_input() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let id = service.start_session(candidate(), InterviewMode::Practice);

    let response = analyze_handler::<OfflineProvider, RecordingPublisher>(
        State(service),
        Path(id.0),
        axum::Json(AnalyzeRequest::text_only("请介绍一下你自己", "   ")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let created = router
        .clone()
        .oneshot(post_json(
            "/api/v1/interview/sessions",
            json!({
                "candidate_name": "Li Wei",
                "domain": "bigdata",
                "position": "Data Engineer",
                "mode": "formal",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = read_json_body(created).await;
    let session_id = created["session_id"].as_str().expect("session id").to_string();
    let base = format!("/api/v1/interview/sessions/{session_id}");

    let analyzed = router
        .clone()
        .oneshot(post_json(
            &format!("{base}/responses"),
            json!({
                "question": "Spark 和 MapReduce 有什么区别？",
                "text": "Spark 基于内存计算，我在项目中用它替换了 MapReduce 作业，速度提升明显",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(analyzed.status(), StatusCode::OK);
    let analyzed = read_json_body(analyzed).await;
    assert_eq!(analyzed["question_number"], 1);
    assert_eq!(analyzed["dimensions"]["technical_domain"], "big_data");
    assert!(analyzed["fused_score"]["overall_score"].as_f64().is_some());

    let hint = router
        .clone()
        .oneshot(post_json(
            &format!("{base}/hints"),
            json!({ "question": "什么是数据倾斜？", "response": "不清楚" }),
        ))
        .await
        .unwrap();
    assert_eq!(hint.status(), StatusCode::OK);
    let hint = read_json_body(hint).await;
    assert_eq!(hint["hint_type"], "knowledge_guidance");
    assert_eq!(hint["urgency"], "high");
    assert_eq!(hint["question_number"], 2);

    let signals = router
        .clone()
        .oneshot(post_json(
            &format!("{base}/signals"),
            json!({ "attention": 0.9, "stress": "low" }),
        ))
        .await
        .unwrap();
    assert_eq!(signals.status(), StatusCode::ACCEPTED);

    let events = router.clone().oneshot(get(&format!("{base}/events"))).await.unwrap();
    assert_eq!(events.status(), StatusCode::OK);
    let events = read_json_body(events).await;
    assert_eq!(events["events"], json!([]));

    let ended = router
        .clone()
        .oneshot(post_empty(&format!("{base}/end")))
        .await
        .unwrap();
    assert_eq!(ended.status(), StatusCode::OK);
    let ended = read_json_body(ended).await;
    assert_eq!(ended["status"], "completed");
    assert_eq!(ended["responses"], 1);
    assert_eq!(ended["hints_by_type"]["knowledge_guidance"], 1);

    let late = router
        .clone()
        .oneshot(post_json(
            &format!("{base}/responses"),
            json!({ "question": "还有问题吗？", "text": "没有了" }),
        ))
        .await
        .unwrap();
    assert_eq!(late.status(), StatusCode::CONFLICT);

    let summary = router.oneshot(get(&base)).await.unwrap();
    assert_eq!(summary.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_session_returns_not_found() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/interview/sessions/sess-missing/responses",
            json!({ "question": "问题", "text": "回答" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("sess-missing"));
}

#[tokio::test]
async fn pause_and_resume_round_trip_over_http() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let created = router
        .clone()
        .oneshot(post_json(
            "/api/v1/interview/sessions",
            json!({ "candidate_name": "Zhang San", "domain": "iot", "position": "Embedded Engineer" }),
        ))
        .await
        .unwrap();
    let created = read_json_body(created).await;
    let base = format!(
        "/api/v1/interview/sessions/{}",
        created["session_id"].as_str().unwrap()
    );

    let paused = router
        .clone()
        .oneshot(post_empty(&format!("{base}/pause")))
        .await
        .unwrap();
    assert_eq!(paused.status(), StatusCode::OK);

    let paused_again = router
        .clone()
        .oneshot(post_empty(&format!("{base}/pause")))
        .await
        .unwrap();
    assert_eq!(paused_again.status(), StatusCode::CONFLICT);

    let answer = router
        .clone()
        .oneshot(post_json(
            &format!("{base}/responses"),
            json!({ "question": "什么是 MQTT？", "text": "一种发布订阅协议" }),
        ))
        .await
        .unwrap();
    assert_eq!(answer.status(), StatusCode::CONFLICT);

    let resumed = router
        .oneshot(post_empty(&format!("{base}/resume")))
        .await
        .unwrap();
    assert_eq!(resumed.status(), StatusCode::OK);
    assert_eq!(read_json_body(resumed).await["status"], "active");
}
