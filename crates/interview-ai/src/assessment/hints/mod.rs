mod catalog;
mod policy;

use serde::{Deserialize, Serialize};

use super::classifier::{DimensionProfile, TechnicalDomain};

const FALLBACK_HINT_TEXT: &str = "请继续作答，尽量说明你的思路。";
const MAX_EXAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintType {
    KnowledgeGuidance,
    DetailExpansion,
    PracticalExamples,
    ComprehensiveImprovement,
    Constructive,
}

impl HintType {
    pub fn label(&self) -> &'static str {
        match self {
            HintType::KnowledgeGuidance => "knowledge_guidance",
            HintType::DetailExpansion => "detail_expansion",
            HintType::PracticalExamples => "practical_examples",
            HintType::ComprehensiveImprovement => "comprehensive_improvement",
            HintType::Constructive => "constructive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// When the UI should surface the hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintTiming {
    Immediate,
    NextPause,
    EndOfAnswer,
}

/// Guidance offered to the candidate mid-interview. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub question_number: u32,
    pub text: String,
    pub hint_type: HintType,
    pub urgency: Urgency,
    pub timing: HintTiming,
    pub technical_domain: TechnicalDomain,
    pub guidance: String,
    pub examples: Vec<String>,
}

/// Maps a dimension profile onto a hint strategy and its catalog text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintStrategySelector;

impl HintStrategySelector {
    pub fn new() -> Self {
        Self
    }

    pub fn select_hint(&self, profile: &DimensionProfile, question_number: u32) -> Hint {
        let strategy = policy::select_strategy(profile);
        let domain = profile.technical_domain;

        let mut entry = catalog::lookup(domain, strategy.hint_type);
        if entry.guidance.trim().is_empty() {
            entry = catalog::generic(strategy.hint_type);
        }

        let headline = catalog::headline(strategy.hint_type, domain);
        let text = if entry.guidance.trim().is_empty() {
            format!("{headline}{FALLBACK_HINT_TEXT}")
        } else {
            format!("{headline}{}。", entry.guidance)
        };

        Hint {
            question_number,
            text,
            hint_type: strategy.hint_type,
            urgency: strategy.urgency,
            timing: strategy.timing,
            technical_domain: domain,
            guidance: entry.guidance.to_string(),
            examples: entry
                .examples
                .iter()
                .take(MAX_EXAMPLES)
                .map(|example| example.to_string())
                .collect(),
        }
    }
}
