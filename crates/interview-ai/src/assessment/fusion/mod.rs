mod config;
pub(crate) mod metrics;

pub use config::FusionConfig;
pub use metrics::{VideoFeatures, VoiceFeatures};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Channel, ModalityScore};

const MAX_SCORE: f64 = 100.0;

/// Single assessment produced from all channels present for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedScore {
    pub overall_score: f64,
    pub confidence: f64,
    pub reliability: f64,
    pub effective_weights: BTreeMap<Channel, f64>,
}

/// Rejected fusion input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FusionError {
    #[error("at least one modality score is required")]
    NoModalities,
    #[error("{channel:?} score {score} is outside 0-100")]
    ScoreOutOfRange { channel: Channel, score: f64 },
    #[error("{0:?} channel supplied more than once")]
    DuplicateChannel(Channel),
}

/// Stateless weighted fusion over the text, voice, and video channels.
#[derive(Debug, Clone, Default)]
pub struct ScoreFusion {
    config: FusionConfig,
}

impl ScoreFusion {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Redistributes the canonical weights over the channels present so they sum to 1.0.
    ///
    /// Channels whose canonical weights are all zero share the weight evenly.
    pub fn effective_weights(&self, channels: &[Channel]) -> BTreeMap<Channel, f64> {
        let canonical_total: f64 = channels
            .iter()
            .map(|channel| self.config.weight_for(*channel).max(0.0))
            .sum();

        channels
            .iter()
            .map(|channel| {
                let weight = if canonical_total > f64::EPSILON {
                    self.config.weight_for(*channel).max(0.0) / canonical_total
                } else {
                    1.0 / channels.len() as f64
                };
                (*channel, weight)
            })
            .collect()
    }

    pub fn fuse<'a, I>(&self, scores: I) -> Result<FusedScore, FusionError>
    where
        I: IntoIterator<Item = &'a ModalityScore>,
    {
        let mut present: Vec<&ModalityScore> = Vec::new();
        for score in scores {
            if !score.score.is_finite() || !(0.0..=MAX_SCORE).contains(&score.score) {
                return Err(FusionError::ScoreOutOfRange {
                    channel: score.channel,
                    score: score.score,
                });
            }
            if present.iter().any(|seen| seen.channel == score.channel) {
                return Err(FusionError::DuplicateChannel(score.channel));
            }
            present.push(score);
        }

        if present.is_empty() {
            return Err(FusionError::NoModalities);
        }

        let channels: Vec<Channel> = present.iter().map(|score| score.channel).collect();
        let effective_weights = self.effective_weights(&channels);

        let overall_score = present
            .iter()
            .map(|score| effective_weights[&score.channel] * score.score)
            .sum::<f64>()
            .clamp(0.0, MAX_SCORE);

        Ok(FusedScore {
            overall_score,
            confidence: self.confidence(&present),
            reliability: self.reliability(&present),
            effective_weights,
        })
    }

    fn confidence(&self, present: &[&ModalityScore]) -> f64 {
        if present.len() == 1 {
            return self.config.single_channel_confidence_cap.clamp(0.0, MAX_SCORE);
        }

        let count = present.len() as f64;
        let mean = present.iter().map(|score| score.score).sum::<f64>() / count;
        let variance = present
            .iter()
            .map(|score| (score.score - mean).powi(2))
            .sum::<f64>()
            / count;

        (MAX_SCORE - self.config.disagreement_penalty * variance.sqrt()).clamp(0.0, MAX_SCORE)
    }

    fn reliability(&self, present: &[&ModalityScore]) -> f64 {
        let expected = self.config.expected_channels.max(1) as f64;
        let coverage: f64 = present
            .iter()
            .map(|score| {
                if score.degraded {
                    self.config.fallback_reliability_factor.clamp(0.0, 1.0)
                } else {
                    1.0
                }
            })
            .sum();

        (coverage / expected * MAX_SCORE).clamp(0.0, MAX_SCORE)
    }
}
