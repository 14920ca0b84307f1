use serde::{Deserialize, Serialize};

use super::super::domain::Channel;

/// Canonical channel weights and the confidence/reliability dials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub text_weight: f64,
    pub voice_weight: f64,
    pub video_weight: f64,
    /// Confidence ceiling when only one channel is present.
    pub single_channel_confidence_cap: f64,
    /// Confidence points lost per point of cross-channel standard deviation.
    pub disagreement_penalty: f64,
    /// Share of a full channel credited to reliability when the channel is degraded.
    pub fallback_reliability_factor: f64,
    pub expected_channels: usize,
}

impl FusionConfig {
    pub fn weight_for(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Text => self.text_weight,
            Channel::Voice => self.voice_weight,
            Channel::Video => self.video_weight,
        }
    }

    pub fn with_weights(mut self, text: f64, voice: f64, video: f64) -> Self {
        self.text_weight = text;
        self.voice_weight = voice;
        self.video_weight = video;
        self
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            text_weight: 0.35,
            voice_weight: 0.30,
            video_weight: 0.35,
            single_channel_confidence_cap: 80.0,
            disagreement_penalty: 2.0,
            fallback_reliability_factor: 0.75,
            expected_channels: Channel::ALL.len(),
        }
    }
}
