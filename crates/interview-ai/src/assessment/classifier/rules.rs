//! Declarative keyword tables backing the response classifier.
//!
//! Matching runs over normalized text, so every marker below is written in lowercase. CJK
//! markers match as substrings; ASCII markers must start on a word boundary and may only be
//! followed by a common inflection ("sensors", "implemented").

use std::collections::BTreeSet;

use super::{QuestionType, TechnicalDomain};

/// Maps a category to the markers whose presence selects it.
pub(crate) struct KeywordRule<T: 'static> {
    pub category: T,
    pub markers: &'static [&'static str],
}

pub(crate) const DEFAULT_NEGATION_MARKERS: &[&str] = &[
    "不知道",
    "没有接触过",
    "没接触过",
    "不清楚",
    "不了解",
    "没学过",
    "don't know",
    "do not know",
    "not sure",
    "no idea",
    "never used",
];

/// Ordered by priority: ties in hit count resolve to the earlier rule.
pub(crate) const DOMAIN_RULES: &[KeywordRule<TechnicalDomain>] = &[
    KeywordRule {
        category: TechnicalDomain::ArtificialIntelligence,
        markers: &[
            "人工智能",
            "机器学习",
            "深度学习",
            "神经网络",
            "大模型",
            "模型训练",
            "自然语言处理",
            "machine learning",
            "deep learning",
            "neural network",
            "tensorflow",
            "pytorch",
            "transformer",
            "llm",
        ],
    },
    KeywordRule {
        category: TechnicalDomain::BigData,
        markers: &[
            "大数据",
            "数据仓库",
            "数据湖",
            "分布式计算",
            "hadoop",
            "spark",
            "flink",
            "kafka",
            "hive",
            "mapreduce",
            "data warehouse",
            "data pipeline",
        ],
    },
    KeywordRule {
        category: TechnicalDomain::InternetOfThings,
        markers: &[
            "物联网",
            "传感器",
            "嵌入式",
            "边缘计算",
            "单片机",
            "mqtt",
            "zigbee",
            "iot",
            "sensor",
            "embedded",
            "firmware",
            "edge computing",
        ],
    },
];

pub(crate) const QUESTION_TYPE_RULES: &[KeywordRule<QuestionType>] = &[
    KeywordRule {
        category: QuestionType::Behavioral,
        markers: &[
            "经历",
            "团队",
            "冲突",
            "挑战",
            "你曾经",
            "tell me about a time",
            "describe a situation",
            "teamwork",
            "challenge",
        ],
    },
    KeywordRule {
        category: QuestionType::Scenario,
        markers: &[
            "如果",
            "假设",
            "场景",
            "如何设计",
            "how would you",
            "suppose",
            "imagine",
            "design a",
        ],
    },
    KeywordRule {
        category: QuestionType::Technical,
        markers: &[
            "原理",
            "实现",
            "算法",
            "区别",
            "优化",
            "架构",
            "how does",
            "explain",
            "difference between",
            "algorithm",
            "implement",
        ],
    },
];

pub(crate) const THEORETICAL_MARKERS: &[&str] = &[
    "理论",
    "概念",
    "原理",
    "定义",
    "一般来说",
    "theory",
    "concept",
    "in principle",
    "in general",
    "by definition",
];

pub(crate) const PRACTICAL_MARKERS: &[&str] = &[
    "项目中",
    "实践中",
    "使用过",
    "用过",
    "我在",
    "我们在",
    "部署",
    "上线",
    "实现了",
    "in my project",
    "in production",
    "i used",
    "i built",
    "we deployed",
    "hands-on",
];

/// Concrete tools count as lived experience.
pub(crate) const TOOL_NAMES: &[&str] = &[
    "tensorflow",
    "pytorch",
    "scikit-learn",
    "spark",
    "hadoop",
    "flink",
    "kafka",
    "docker",
    "kubernetes",
    "redis",
    "mqtt",
    "arduino",
    "raspberry pi",
];

pub(crate) const STRUCTURE_MARKERS: &[&str] = &[
    "首先",
    "其次",
    "然后",
    "最后",
    "总之",
    "另外",
    "例如",
    "比如",
    "first",
    "second",
    "then",
    "finally",
    "for example",
    "in summary",
];

const CJK_STOP_TERMS: &[&str] = &[
    "什么", "如何", "怎么", "怎样", "请你", "你的", "一下", "哪些", "为什么", "是否", "介绍", "谈谈",
];

const ASCII_STOP_TERMS: &[&str] = &[
    "what", "when", "which", "would", "your", "have", "about", "describe", "explain", "please",
    "with", "that", "this", "does", "there", "their",
];

pub(crate) fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

pub(crate) fn visible_chars(text: &str) -> usize {
    text.chars().filter(|ch| !ch.is_whitespace()).count()
}

const INFLECTIONS: &[&str] = &["", "s", "es", "ed", "ing", "ly", "ation", "ations"];

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
}

/// Whether `marker` occurs in `haystack`, honoring word boundaries for ASCII markers.
pub(crate) fn contains_marker(haystack: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    if !marker.is_ascii() {
        return haystack.contains(marker);
    }

    haystack.match_indices(marker).any(|(start, _)| {
        let starts_word = !marker.starts_with(is_word_char)
            || !haystack[..start].ends_with(is_word_char);
        if !starts_word {
            return false;
        }
        if !marker.ends_with(is_word_char) {
            return true;
        }
        let rest = &haystack[start + marker.len()..];
        let suffix_len = rest.find(|ch: char| !is_word_char(ch)).unwrap_or(rest.len());
        INFLECTIONS.contains(&&rest[..suffix_len])
    })
}

pub(crate) fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| contains_marker(haystack, marker))
}

pub(crate) fn contains_any_owned(haystack: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|marker| contains_marker(haystack, &marker.to_lowercase()))
}

pub(crate) fn count_hits(haystack: &str, markers: &[&str]) -> usize {
    markers
        .iter()
        .filter(|marker| contains_marker(haystack, marker))
        .count()
}

pub(crate) fn domain_keyword_hits(haystack: &str) -> usize {
    DOMAIN_RULES
        .iter()
        .map(|rule| count_hits(haystack, rule.markers))
        .sum()
}

/// Domain with the most keyword hits; `None` when nothing matches.
pub(crate) fn match_domain(haystack: &str) -> Option<TechnicalDomain> {
    let mut best: Option<(TechnicalDomain, usize)> = None;
    for rule in DOMAIN_RULES {
        let hits = count_hits(haystack, rule.markers);
        if hits == 0 {
            continue;
        }
        match best {
            Some((_, best_hits)) if best_hits >= hits => {}
            _ => best = Some((rule.category, hits)),
        }
    }
    best.map(|(domain, _)| domain)
}

pub(crate) fn match_question_type(question: &str) -> QuestionType {
    QUESTION_TYPE_RULES
        .iter()
        .find(|rule| contains_any(question, rule.markers))
        .map(|rule| rule.category)
        .unwrap_or(QuestionType::General)
}

/// Content terms of a normalized question: ASCII words of four or more letters and CJK
/// character bigrams, minus interrogative filler.
pub(crate) fn key_terms(normalized: &str) -> Vec<String> {
    let mut terms = BTreeSet::new();

    for word in normalized.split(|ch: char| !ch.is_ascii_alphanumeric()) {
        if word.len() >= 4 && !ASCII_STOP_TERMS.contains(&word) {
            terms.insert(word.to_string());
        }
    }

    let cjk: Vec<char> = normalized.chars().collect();
    for pair in cjk.windows(2) {
        if is_cjk(pair[0]) && is_cjk(pair[1]) {
            let bigram: String = pair.iter().collect();
            if !CJK_STOP_TERMS.iter().any(|stop| stop.contains(&bigram)) {
                terms.insert(bigram);
            }
        }
    }

    terms.into_iter().collect()
}

fn is_cjk(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}
