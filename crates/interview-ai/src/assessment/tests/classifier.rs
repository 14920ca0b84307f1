use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::assessment::{
    AnswerQuality, ClassifierConfig, QuestionType, ResponseDimensionClassifier, ResponsePattern,
    TechnicalDomain,
};

pub(super) const DETAILED_PRACTICAL_ANSWER: &str = "我在项目中使用 PyTorch 训练深度学习模型，并把它部署上线。\
我在项目中使用 PyTorch 训练深度学习模型，并把它部署上线。\
我在项目中使用 PyTorch 训练深度学习模型，并把它部署上线。\
我在项目中使用 PyTorch 训练深度学习模型，并把它部署上线。";

pub(super) const THEORETICAL_ANSWER: &str = "从理论上讲，这个概念的核心是通过不断迭代来最小化损失函数";

fn classifier() -> ResponseDimensionClassifier {
    ResponseDimensionClassifier::default()
}

#[test]
fn admitted_ignorance_is_unknown_quality() {
    let profile = classifier().classify("什么是迁移学习？", "不知道，没有接触过", None);

    assert_eq!(profile.answer_quality, AnswerQuality::Unknown);
}

#[test]
fn negation_matching_ignores_case() {
    let profile = classifier().classify("Explain backpropagation", "I DON'T KNOW", None);

    assert_eq!(profile.answer_quality, AnswerQuality::Unknown);
    assert_eq!(profile.question_type, QuestionType::Technical);
}

#[test]
fn empty_answer_is_unknown_quality() {
    let profile = classifier().classify("请介绍一下 Spark 的原理", "   ", None);

    assert_eq!(profile.answer_quality, AnswerQuality::Unknown);
    assert_eq!(profile.technical_domain, TechnicalDomain::BigData);
}

#[test]
fn answer_quality_follows_length_and_domain_keywords() {
    let classifier = classifier();

    let brief = classifier.classify("你用过 Docker 吗？", "用过一点", None);
    assert_eq!(brief.answer_quality, AnswerQuality::Brief);

    let adequate = classifier.classify("什么是梯度下降？", THEORETICAL_ANSWER, None);
    assert_eq!(adequate.answer_quality, AnswerQuality::Adequate);

    let detailed = classifier.classify("介绍一个你的项目", DETAILED_PRACTICAL_ANSWER, None);
    assert_eq!(detailed.answer_quality, AnswerQuality::Detailed);
    assert_eq!(
        detailed.technical_domain,
        TechnicalDomain::ArtificialIntelligence
    );
}

#[test]
fn long_answer_without_domain_keywords_stays_adequate() {
    let answer = "我会先和团队成员沟通，了解大家的想法，然后整理出几个方案进行比较。".repeat(4);

    let profile = classifier().classify("讲一个团队合作的经历", &answer, None);

    assert_eq!(profile.answer_quality, AnswerQuality::Adequate);
    assert_eq!(profile.question_type, QuestionType::Behavioral);
}

#[test]
fn thresholds_are_configurable() {
    let classifier = ResponseDimensionClassifier::new(ClassifierConfig {
        brief_char_threshold: 2,
        ..ClassifierConfig::default()
    });

    let profile = classifier.classify("你用过 Docker 吗？", "用过一点", None);

    assert_eq!(profile.answer_quality, AnswerQuality::Adequate);
}

#[test]
fn response_pattern_reads_markers_and_tools() {
    let classifier = classifier();

    let theoretical = classifier.classify("什么是梯度下降？", THEORETICAL_ANSWER, None);
    assert_eq!(theoretical.response_pattern, ResponsePattern::Theoretical);

    let practical = classifier.classify("你熟悉消息队列吗？", "之前用 Kafka 做过日志收集", None);
    assert_eq!(practical.response_pattern, ResponsePattern::Practical);

    let both = classifier.classify(
        "什么是过拟合？",
        "从理论上讲是模型记住了噪声，我在项目中用正则化缓解过",
        None,
    );
    assert_eq!(both.response_pattern, ResponsePattern::Mixed);

    let neither = classifier.classify("你怎么看加班？", "要看具体情况，合理安排时间", None);
    assert_eq!(neither.response_pattern, ResponsePattern::Mixed);
}

#[test]
fn question_types_are_recognized() {
    let classifier = classifier();

    assert_eq!(
        classifier
            .classify("请解释 Transformer 的原理", "", None)
            .question_type,
        QuestionType::Technical
    );
    assert_eq!(
        classifier
            .classify("如果线上服务突然变慢，你会怎么排查？", "", None)
            .question_type,
        QuestionType::Scenario
    );
    assert_eq!(
        classifier
            .classify("讲一个你在团队中处理冲突的经历", "", None)
            .question_type,
        QuestionType::Behavioral
    );
    assert_eq!(
        classifier.classify("你好，请先做个自我介绍", "", None).question_type,
        QuestionType::General
    );
}

#[test]
fn domain_hint_applies_only_without_keyword_evidence() {
    let classifier = classifier();

    let hinted = classifier.classify("说说你最近的项目", "做了一个温度监控系统", Some("iot"));
    assert_eq!(hinted.technical_domain, TechnicalDomain::InternetOfThings);

    let evidence = classifier.classify("说说你最近的项目", "用 Hadoop 跑离线任务", Some("iot"));
    assert_eq!(evidence.technical_domain, TechnicalDomain::BigData);

    let unhinted = classifier.classify("说说你最近的项目", "做了一个温度监控系统", None);
    assert_eq!(unhinted.technical_domain, TechnicalDomain::General);

    let unknown_hint = classifier.classify("说说你最近的项目", "做了一个网站", Some("marketing"));
    assert_eq!(unknown_hint.technical_domain, TechnicalDomain::General);
}

#[test]
fn domain_keywords_inside_longer_words_are_ignored() {
    let classifier = classifier();

    let archive = classifier.classify("Tell me about yourself", "I archive my notes every week", None);
    assert_eq!(archive.technical_domain, TechnicalDomain::General);

    let idiot = classifier.classify("Tell me about yourself", "that idiot patriot", None);
    assert_eq!(idiot.technical_domain, TechnicalDomain::General);

    let hive = classifier.classify("Tell me about yourself", "I run Hive queries every week", None);
    assert_eq!(hive.technical_domain, TechnicalDomain::BigData);
}

#[test]
fn classification_is_total_and_deterministic() {
    const ALPHABET: &[&str] = &[
        "不知道", "我在", "理论", "spark", "mqtt", "pytorch", " ", "\n", "，", "a", "Z", "🙂",
        "如果", "原理", "经历", "数据", "x", "？", "",
    ];
    fn build(rng: &mut StdRng) -> String {
        let len = rng.gen_range(0..40);
        (0..len)
            .map(|_| *ALPHABET.choose(rng).expect("alphabet is not empty"))
            .collect()
    }

    let classifier = classifier();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let question = build(&mut rng);
        let answer = build(&mut rng);

        let first = classifier.classify(&question, &answer, Some("ai"));
        let second = classifier.classify(&question, &answer, Some("ai"));
        assert_eq!(first, second);
    }
}
