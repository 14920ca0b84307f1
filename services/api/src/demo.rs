use crate::infra::InMemoryEventPublisher;
use clap::Args;
use interview_ai::assessment::{
    AdaptationEvent, AnalyzeRequest, CandidateProfile, EngineConfig, Hint, HintRequest,
    InterviewAssessmentService, InterviewMode, OfflineProvider, RealtimeSignals,
    ResponseAssessment, SessionSummary, StressLevel, TechnicalDomain, VideoFeatures,
    VoiceFeatures,
};
use interview_ai::error::AppError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Technical domain of the scripted interview (ai, bigdata, iot)
    #[arg(long, default_value = "ai")]
    pub(crate) domain: String,
    /// Run the session in formal mode instead of practice
    #[arg(long)]
    pub(crate) formal: bool,
    /// Print the full session report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

struct ScriptedAnswer {
    question: &'static str,
    answer: &'static str,
    with_media: bool,
}

#[derive(Debug, Serialize)]
struct DemoTurn {
    question: String,
    assessment: ResponseAssessment,
    hint: Hint,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    candidate: CandidateProfile,
    turns: Vec<DemoTurn>,
    events: Vec<AdaptationEvent>,
    published: usize,
    summary: SessionSummary,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        domain,
        formal,
        json,
    } = args;

    let mut config = EngineConfig::default();
    config.adaptation.performance_interval_secs = 1;

    let publisher = Arc::new(InMemoryEventPublisher::default());
    let service = InterviewAssessmentService::new(
        Arc::new(OfflineProvider),
        publisher.clone(),
        config,
    );

    let candidate = CandidateProfile {
        candidate_name: "Demo Candidate".to_string(),
        domain: domain.clone(),
        position: "Software Engineer".to_string(),
    };
    let mode = if formal {
        InterviewMode::Formal
    } else {
        InterviewMode::Practice
    };
    let session_id = service.start_session(candidate.clone(), mode);

    let mut turns = Vec::new();
    let mut events = Vec::new();
    for scripted in script_for(&domain) {
        let mut request = AnalyzeRequest::text_only(scripted.question, scripted.answer);
        if scripted.with_media {
            request.voice_features = Some(VoiceFeatures {
                speech_rate_wpm: 145.0,
                pause_ratio: 0.18,
                filler_count: 1,
                pitch_variation: 0.25,
            });
            request.video_features = Some(VideoFeatures {
                eye_contact_ratio: 0.8,
                smile_ratio: 0.35,
                posture_stability: 0.85,
                head_movement: 0.15,
            });
        }

        let assessment = service.analyze_response(&session_id, request).await?;
        let hint = service
            .get_hint(
                &session_id,
                HintRequest {
                    question: scripted.question.to_string(),
                    response: scripted.answer.to_string(),
                    question_number: Some(assessment.question_number),
                },
            )
            .await?;
        events.extend(service.adaptation_events(&session_id).await?);

        turns.push(DemoTurn {
            question: scripted.question.to_string(),
            assessment,
            hint,
        });
    }

    service
        .update_signals(
            &session_id,
            RealtimeSignals {
                attention: Some(0.55),
                engagement: Some(0.9),
                stress: Some(StressLevel::High),
            },
        )
        .await?;
    tokio::time::sleep(Duration::from_millis(1200)).await;
    events.extend(service.adaptation_events(&session_id).await?);

    let summary = service.end_session(&session_id).await?;
    let report = DemoReport {
        candidate,
        turns,
        events,
        published: publisher.events().len(),
        summary,
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Demo report unavailable: {err}"),
        }
    } else {
        render_report(&report);
    }

    Ok(())
}

fn render_report(report: &DemoReport) {
    println!("Interview assessment demo");
    println!(
        "Candidate: {} | {} | domain '{}'",
        report.candidate.candidate_name, report.candidate.position, report.candidate.domain
    );

    for turn in &report.turns {
        let assessment = &turn.assessment;
        println!("\nQ{}: {}", assessment.question_number, turn.question);
        println!(
            "  Score {:.1} | confidence {:.1} | reliability {:.1}",
            assessment.fused_score.overall_score,
            assessment.fused_score.confidence,
            assessment.fused_score.reliability
        );
        for (channel, score) in &assessment.modality_scores {
            let degraded = if score.degraded { " (degraded)" } else { "" };
            println!("  - {}: {:.1}{}", channel.label(), score.score, degraded);
        }
        println!(
            "  Dimensions: {:?} question | {} | {:?} answer | {:?} pattern",
            assessment.dimensions.question_type,
            assessment.dimensions.technical_domain.label(),
            assessment.dimensions.answer_quality,
            assessment.dimensions.response_pattern
        );
        println!(
            "  Hint [{} / {:?} / {:?}]: {}",
            turn.hint.hint_type.label(),
            turn.hint.urgency,
            turn.hint.timing,
            turn.hint.text
        );
    }

    if report.events.is_empty() {
        println!("\nAdaptation events: none");
    } else {
        println!("\nAdaptation events");
        for event in &report.events {
            println!(
                "- #{} {} -> {:?} {}",
                event.sequence,
                event.trigger.label(),
                event.action,
                event.payload
            );
        }
    }
    println!("Events published downstream: {}", report.published);

    let summary = &report.summary;
    println!(
        "\nSession {} ({}) | {} responses",
        summary.session_id,
        summary.status.label(),
        summary.responses
    );
    if let (Some(average), Some(best)) = (summary.average_score, summary.best_score) {
        println!("Average score {average:.1} | best {best:.1}");
    }
    for (hint_type, count) in &summary.hints_by_type {
        println!("- {} hints: {}", hint_type.label(), count);
    }
}

fn script_for(domain: &str) -> Vec<ScriptedAnswer> {
    match TechnicalDomain::from_hint(domain) {
        Some(TechnicalDomain::BigData) => vec![
            ScriptedAnswer {
                question: "Spark 和 MapReduce 有什么区别？",
                answer: "首先，Spark 基于内存计算并使用 DAG 调度；其次，我在项目中把离线 MapReduce 作业迁移到 Spark，最后整体耗时缩短了一半。",
                with_media: true,
            },
            ScriptedAnswer {
                question: "如何处理数据倾斜？",
                answer: "不太清楚",
                with_media: false,
            },
            ScriptedAnswer {
                question: "Kafka 如何保证消息不丢失？",
                answer: "生产者设置 acks=all 并开启重试，同时配置副本数",
                with_media: true,
            },
        ],
        Some(TechnicalDomain::InternetOfThings) => vec![
            ScriptedAnswer {
                question: "MQTT 的 QoS 等级有哪些？",
                answer: "首先，QoS 0 至多一次；其次，QoS 1 至少一次；最后，QoS 2 恰好一次。我在项目中给传感器上报用了 QoS 1。",
                with_media: true,
            },
            ScriptedAnswer {
                question: "边缘计算解决了什么问题？",
                answer: "不知道",
                with_media: false,
            },
            ScriptedAnswer {
                question: "如何降低设备功耗？",
                answer: "通过休眠调度和减少无线通信次数来降低功耗",
                with_media: true,
            },
        ],
        _ => vec![
            ScriptedAnswer {
                question: "请解释一下 Transformer 的原理",
                answer: "首先，Transformer 依靠自注意力机制建模序列关系；其次，我在项目中用 PyTorch 实现过文本分类模型，最后部署上线后效果稳定。",
                with_media: true,
            },
            ScriptedAnswer {
                question: "什么是联邦学习？",
                answer: "不知道",
                with_media: false,
            },
            ScriptedAnswer {
                question: "如何缓解模型过拟合？",
                answer: "可以使用正则化、dropout 和数据增强",
                with_media: true,
            },
        ],
    }
}
