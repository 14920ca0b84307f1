use super::super::classifier::TechnicalDomain;
use super::HintType;

/// Guidance text and sample phrasings for one `(domain, hint type)` pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CatalogEntry {
    pub guidance: &'static str,
    pub examples: &'static [&'static str],
}

struct DomainEntry {
    domain: TechnicalDomain,
    hint_type: HintType,
    entry: CatalogEntry,
}

const DOMAIN_ENTRIES: &[DomainEntry] = &[
    DomainEntry {
        domain: TechnicalDomain::ArtificialIntelligence,
        hint_type: HintType::KnowledgeGuidance,
        entry: CatalogEntry {
            guidance: "从监督学习与无监督学习的区别讲起，再说说模型是如何训练和评估的",
            examples: &[
                "我理解机器学习是让模型从数据中学习规律，比如分类任务会用标注数据训练……",
                "评估模型时我会关注准确率、召回率，以及是否过拟合",
            ],
        },
    },
    DomainEntry {
        domain: TechnicalDomain::ArtificialIntelligence,
        hint_type: HintType::PracticalExamples,
        entry: CatalogEntry {
            guidance: "结合一个你训练或调优过的模型，说明数据规模、指标变化和遇到的问题",
            examples: &[
                "在课程项目中我用 PyTorch 训练了一个图像分类模型，准确率从 82% 提升到 90%",
                "调参时发现学习率过大导致损失震荡，后来改用了学习率衰减",
            ],
        },
    },
    DomainEntry {
        domain: TechnicalDomain::ArtificialIntelligence,
        hint_type: HintType::DetailExpansion,
        entry: CatalogEntry {
            guidance: "补充算法选择的理由、关键参数以及效果对比",
            examples: &["我选择 Transformer 是因为它能并行处理长序列，相比 RNN 训练更快"],
        },
    },
    DomainEntry {
        domain: TechnicalDomain::BigData,
        hint_type: HintType::KnowledgeGuidance,
        entry: CatalogEntry {
            guidance: "可以先说说批处理与流处理的区别，以及数据是如何被分布式存储和计算的",
            examples: &[
                "Hadoop 用 HDFS 存储数据、用 MapReduce 做批量计算",
                "如果需要实时处理，我会考虑 Kafka 加 Flink 的组合",
            ],
        },
    },
    DomainEntry {
        domain: TechnicalDomain::BigData,
        hint_type: HintType::PracticalExamples,
        entry: CatalogEntry {
            guidance: "描述一条你搭建或维护过的数据管道：数据量、处理时延以及如何保证数据质量",
            examples: &[
                "我们每天处理约 2 亿条日志，用 Spark 做清洗，把任务耗时从 3 小时降到 40 分钟",
                "为了解决数据倾斜，我对热点 key 做了加盐打散",
            ],
        },
    },
    DomainEntry {
        domain: TechnicalDomain::BigData,
        hint_type: HintType::DetailExpansion,
        entry: CatalogEntry {
            guidance: "补充存储选型、分区策略和容错机制等细节",
            examples: &["按日期分区后，查询只需扫描当天数据，延迟明显降低"],
        },
    },
    DomainEntry {
        domain: TechnicalDomain::InternetOfThings,
        hint_type: HintType::KnowledgeGuidance,
        entry: CatalogEntry {
            guidance: "从感知层、网络层、应用层的分层结构讲起，说明设备数据如何上报到云端",
            examples: &[
                "传感器采集温湿度后通过 MQTT 发布到服务器",
                "边缘计算可以在设备侧先做过滤，减少上行带宽",
            ],
        },
    },
    DomainEntry {
        domain: TechnicalDomain::InternetOfThings,
        hint_type: HintType::PracticalExamples,
        entry: CatalogEntry {
            guidance: "介绍一个你做过的硬件或设备联网项目，说明通信协议和功耗、稳定性方面的取舍",
            examples: &[
                "我用 ESP32 做过智能家居网关，通过 MQTT 控制灯光",
                "为了降低功耗，设备每 5 分钟唤醒一次上报数据",
            ],
        },
    },
    DomainEntry {
        domain: TechnicalDomain::InternetOfThings,
        hint_type: HintType::DetailExpansion,
        entry: CatalogEntry {
            guidance: "补充协议选择、设备管理和安全认证方面的细节",
            examples: &["设备接入时使用双向 TLS 认证，防止伪造设备上报数据"],
        },
    },
];

const GENERIC_KNOWLEDGE_GUIDANCE: CatalogEntry = CatalogEntry {
    guidance: "可以先说说你对这个概念的基本理解，或者与之相关、你熟悉的知识点",
    examples: &[
        "虽然我没有直接用过，但我理解它主要解决的是……",
        "我接触过类似的技术，它们的共同点是……",
    ],
};

const GENERIC_DETAIL_EXPANSION: CatalogEntry = CatalogEntry {
    guidance: "尝试展开回答：背景是什么、你做了什么、结果如何",
    examples: &[
        "具体来说，当时的背景是……",
        "我负责的部分是……，最终结果是……",
    ],
};

const GENERIC_PRACTICAL_EXAMPLES: CatalogEntry = CatalogEntry {
    guidance: "结合一个具体的项目或实践经历来说明你的观点",
    examples: &[
        "比如在我参与的一个项目中……",
        "我实际使用时遇到过这样的问题……",
    ],
};

const GENERIC_COMPREHENSIVE_IMPROVEMENT: CatalogEntry = CatalogEntry {
    guidance: "回答已经很充分，可以再总结关键收获，并谈谈如果重做会如何改进",
    examples: &[
        "回顾这个项目，我最大的收获是……",
        "如果重新设计，我会在……方面做得更好",
    ],
};

const GENERIC_CONSTRUCTIVE: CatalogEntry = CatalogEntry {
    guidance: "注意回答的条理性，先给出结论，再分点说明理由",
    examples: &["我的结论是……，主要有三点原因：第一……"],
};

pub(crate) fn lookup(domain: TechnicalDomain, hint_type: HintType) -> CatalogEntry {
    DOMAIN_ENTRIES
        .iter()
        .find(|candidate| candidate.domain == domain && candidate.hint_type == hint_type)
        .map(|candidate| candidate.entry)
        .unwrap_or_else(|| generic(hint_type))
}

pub(crate) fn generic(hint_type: HintType) -> CatalogEntry {
    match hint_type {
        HintType::KnowledgeGuidance => GENERIC_KNOWLEDGE_GUIDANCE,
        HintType::DetailExpansion => GENERIC_DETAIL_EXPANSION,
        HintType::PracticalExamples => GENERIC_PRACTICAL_EXAMPLES,
        HintType::ComprehensiveImprovement => GENERIC_COMPREHENSIVE_IMPROVEMENT,
        HintType::Constructive => GENERIC_CONSTRUCTIVE,
    }
}

/// Lead-in sentence shown before the guidance.
pub(crate) fn headline(hint_type: HintType, domain: TechnicalDomain) -> String {
    match hint_type {
        HintType::KnowledgeGuidance => {
            format!("没关系，可以先从{}的基础知识谈起。", domain.label())
        }
        HintType::DetailExpansion => "回答有些简短，可以再多展开一些。".to_string(),
        HintType::PracticalExamples => "理论部分讲得不错，再补充一些实践经验会更有说服力。".to_string(),
        HintType::ComprehensiveImprovement => "回答很完整，可以做进一步的提炼。".to_string(),
        HintType::Constructive => "继续保持，下面是一些可以让回答更出色的建议。".to_string(),
    }
}
