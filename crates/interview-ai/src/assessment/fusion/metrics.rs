//! Local heuristic scoring for each channel, used when the external analysis provider is
//! disabled or unavailable.

use serde::{Deserialize, Serialize};

use super::super::classifier::rules;
use super::super::classifier::{AnswerQuality, ClassifierConfig, DimensionProfile};
use super::super::domain::{Channel, ModalityScore};

const UNKNOWN_ANSWER_TEXT_CAP: f64 = 25.0;
const NEUTRAL_RELEVANCE: f64 = 60.0;
const IDEAL_PACE_WPM: (f64, f64) = (110.0, 170.0);
const IDEAL_PAUSE_RATIO: f64 = 0.15;

/// Speech measurements captured client-side for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceFeatures {
    pub speech_rate_wpm: f64,
    pub pause_ratio: f64,
    pub filler_count: u32,
    pub pitch_variation: f64,
}

/// Face and posture measurements captured client-side for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFeatures {
    pub eye_contact_ratio: f64,
    pub smile_ratio: f64,
    pub posture_stability: f64,
    pub head_movement: f64,
}

pub(crate) fn text_score(
    question: &str,
    response: &str,
    profile: &DimensionProfile,
    config: &ClassifierConfig,
) -> ModalityScore {
    let normalized = rules::normalize(response);
    let length = rules::visible_chars(response) as f64;

    let completeness = (length / config.detailed_char_threshold.max(1) as f64 * 100.0)
        .clamp(10.0, 100.0);
    let keyword_hits = rules::domain_keyword_hits(&normalized) as f64;
    let technical_depth = (40.0 + keyword_hits * 15.0).min(100.0);
    let structure_hits = rules::count_hits(&normalized, rules::STRUCTURE_MARKERS) as f64;
    let structure = (50.0 + structure_hits * 15.0).min(100.0);
    let relevance = relevance(question, &normalized);

    let mut score = (completeness + technical_depth + structure + relevance) / 4.0;
    if profile.answer_quality == AnswerQuality::Unknown {
        score = score.min(UNKNOWN_ANSWER_TEXT_CAP);
    }

    ModalityScore::new(Channel::Text, score.clamp(0.0, 100.0))
        .with_metric("completeness", completeness)
        .with_metric("technical_depth", technical_depth)
        .with_metric("structure", structure)
        .with_metric("relevance", relevance)
}

pub(crate) fn voice_score(features: &VoiceFeatures) -> ModalityScore {
    let rate = finite_or_zero(features.speech_rate_wpm);
    let pause_ratio = finite_or_zero(features.pause_ratio).clamp(0.0, 1.0);
    let pitch = finite_or_zero(features.pitch_variation).clamp(0.0, 1.0);

    let pace = if rate < IDEAL_PACE_WPM.0 {
        100.0 - (IDEAL_PACE_WPM.0 - rate)
    } else if rate > IDEAL_PACE_WPM.1 {
        100.0 - (rate - IDEAL_PACE_WPM.1)
    } else {
        100.0
    }
    .clamp(0.0, 100.0);
    let fluency =
        (100.0 - pause_ratio * 120.0 - features.filler_count as f64 * 5.0).clamp(0.0, 100.0);
    let clarity = (100.0 - (pause_ratio - IDEAL_PAUSE_RATIO).abs() * 200.0).clamp(0.0, 100.0);
    let expressiveness = (50.0 + 50.0 * (pitch / 0.25).min(1.0)).clamp(0.0, 100.0);

    let score = (pace + fluency + clarity + expressiveness) / 4.0;
    ModalityScore::new(Channel::Voice, score)
        .with_metric("pace", pace)
        .with_metric("fluency", fluency)
        .with_metric("clarity", clarity)
        .with_metric("expressiveness", expressiveness)
}

pub(crate) fn video_score(features: &VideoFeatures) -> ModalityScore {
    let eye_contact = unit(features.eye_contact_ratio) * 100.0;
    let expression = 50.0 + unit(features.smile_ratio) * 50.0;
    let posture = unit(features.posture_stability) * 100.0;
    let composure = 100.0 - unit(features.head_movement) * 100.0;

    let score = (eye_contact + expression + posture + composure) / 4.0;
    ModalityScore::new(Channel::Video, score)
        .with_metric("eye_contact", eye_contact)
        .with_metric("expression", expression)
        .with_metric("posture", posture)
        .with_metric("composure", composure)
}

/// Share of the question's key terms echoed by the answer, scaled so half coverage is full marks.
fn relevance(question: &str, normalized_response: &str) -> f64 {
    let terms = rules::key_terms(&rules::normalize(question));
    if terms.is_empty() {
        return NEUTRAL_RELEVANCE;
    }

    let covered = terms
        .iter()
        .filter(|term| rules::contains_marker(normalized_response, term))
        .count() as f64;
    (covered / terms.len() as f64 * 200.0).clamp(0.0, 100.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn unit(value: f64) -> f64 {
    finite_or_zero(value).clamp(0.0, 1.0)
}
