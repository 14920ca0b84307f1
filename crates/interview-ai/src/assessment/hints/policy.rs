use super::super::classifier::{AnswerQuality, DimensionProfile, ResponsePattern};
use super::{HintTiming, HintType, Urgency};

/// Strategy chosen for a profile before any text is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HintStrategy {
    pub hint_type: HintType,
    pub urgency: Urgency,
    pub timing: HintTiming,
}

/// First matching rule wins; remediation outranks refinement.
pub(crate) fn select_strategy(profile: &DimensionProfile) -> HintStrategy {
    if profile.answer_quality == AnswerQuality::Unknown {
        return HintStrategy {
            hint_type: HintType::KnowledgeGuidance,
            urgency: Urgency::High,
            timing: HintTiming::Immediate,
        };
    }

    if profile.answer_quality == AnswerQuality::Brief {
        return HintStrategy {
            hint_type: HintType::DetailExpansion,
            urgency: Urgency::Medium,
            timing: HintTiming::NextPause,
        };
    }

    if profile.response_pattern == ResponsePattern::Theoretical {
        return HintStrategy {
            hint_type: HintType::PracticalExamples,
            urgency: Urgency::Medium,
            timing: HintTiming::NextPause,
        };
    }

    if profile.answer_quality == AnswerQuality::Detailed
        && profile.response_pattern == ResponsePattern::Practical
    {
        return HintStrategy {
            hint_type: HintType::ComprehensiveImprovement,
            urgency: Urgency::Low,
            timing: HintTiming::EndOfAnswer,
        };
    }

    HintStrategy {
        hint_type: HintType::Constructive,
        urgency: Urgency::Low,
        timing: HintTiming::NextPause,
    }
}
