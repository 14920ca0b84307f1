//! Multimodal scoring and adaptive hint engine for AI-led technical interviews.

pub mod assessment;
pub mod config;
pub mod error;
pub mod telemetry;
