pub(crate) mod rules;

use serde::{Deserialize, Serialize};

/// Kind of interview question being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Technical,
    Behavioral,
    Scenario,
    General,
}

/// Technical area the exchange belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalDomain {
    ArtificialIntelligence,
    BigData,
    InternetOfThings,
    General,
}

impl TechnicalDomain {
    /// Lenient parse of a caller-supplied domain hint.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let normalized = hint.trim().to_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "ai" | "artificialintelligence" | "人工智能" | "ml" | "machinelearning" => {
                Some(Self::ArtificialIntelligence)
            }
            "bigdata" | "大数据" | "data" => Some(Self::BigData),
            "iot" | "internetofthings" | "物联网" => Some(Self::InternetOfThings),
            "general" | "通用" => Some(Self::General),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TechnicalDomain::ArtificialIntelligence => "人工智能",
            TechnicalDomain::BigData => "大数据",
            TechnicalDomain::InternetOfThings => "物联网",
            TechnicalDomain::General => "技术",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerQuality {
    Unknown,
    Brief,
    Adequate,
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePattern {
    Theoretical,
    Practical,
    Mixed,
}

/// Categorical reading of a single candidate answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionProfile {
    pub question_type: QuestionType,
    pub technical_domain: TechnicalDomain,
    pub answer_quality: AnswerQuality,
    pub response_pattern: ResponsePattern,
}

impl Default for DimensionProfile {
    fn default() -> Self {
        Self {
            question_type: QuestionType::General,
            technical_domain: TechnicalDomain::General,
            answer_quality: AnswerQuality::Unknown,
            response_pattern: ResponsePattern::Mixed,
        }
    }
}

/// Thresholds and negation vocabulary for answer-quality grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Answers with fewer visible characters are `brief`.
    pub brief_char_threshold: usize,
    /// Answers with more visible characters and a domain keyword are `detailed`.
    pub detailed_char_threshold: usize,
    pub negation_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            brief_char_threshold: 20,
            detailed_char_threshold: 100,
            negation_markers: rules::DEFAULT_NEGATION_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }
}

/// Total, deterministic classifier over question and answer text.
#[derive(Debug, Clone, Default)]
pub struct ResponseDimensionClassifier {
    config: ClassifierConfig,
}

impl ResponseDimensionClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(
        &self,
        question: &str,
        response: &str,
        domain_hint: Option<&str>,
    ) -> DimensionProfile {
        let question = rules::normalize(question);
        let response = rules::normalize(response);

        let combined = format!("{question} {response}");
        let technical_domain = rules::match_domain(&combined)
            .or_else(|| domain_hint.and_then(TechnicalDomain::from_hint))
            .unwrap_or(TechnicalDomain::General);

        DimensionProfile {
            question_type: rules::match_question_type(&question),
            technical_domain,
            answer_quality: self.answer_quality(&response),
            response_pattern: response_pattern(&response),
        }
    }

    fn answer_quality(&self, response: &str) -> AnswerQuality {
        if response.is_empty() || rules::contains_any_owned(response, &self.config.negation_markers)
        {
            return AnswerQuality::Unknown;
        }

        let length = rules::visible_chars(response);
        if length < self.config.brief_char_threshold {
            AnswerQuality::Brief
        } else if length > self.config.detailed_char_threshold
            && rules::domain_keyword_hits(response) > 0
        {
            AnswerQuality::Detailed
        } else {
            AnswerQuality::Adequate
        }
    }
}

fn response_pattern(response: &str) -> ResponsePattern {
    let theoretical = rules::contains_any(response, rules::THEORETICAL_MARKERS);
    let practical = rules::contains_any(response, rules::PRACTICAL_MARKERS)
        || rules::contains_any(response, rules::TOOL_NAMES);

    match (theoretical, practical) {
        (true, false) => ResponsePattern::Theoretical,
        (false, true) => ResponsePattern::Practical,
        _ => ResponsePattern::Mixed,
    }
}
