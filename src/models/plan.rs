//! 论文大纲计划

use serde::Deserialize;

/// 一次论文生成的大纲计划，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlinePlan {
    pub title: String,
    /// 按顺序排列的章节标题
    pub outline: Vec<String>,
    /// 已格式化好的参考文献区块（Markdown）
    pub bibliography: String,
}

/// 大纲生成的结果：区分"解析成功"和"使用了默认计划"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Parsed(OutlinePlan),
    FallbackUsed(OutlinePlan),
}

impl PlanOutcome {
    pub fn plan(&self) -> &OutlinePlan {
        match self {
            PlanOutcome::Parsed(plan) | PlanOutcome::FallbackUsed(plan) => plan,
        }
    }

    pub fn into_plan(self) -> OutlinePlan {
        match self {
            PlanOutcome::Parsed(plan) | PlanOutcome::FallbackUsed(plan) => plan,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, PlanOutcome::FallbackUsed(_))
    }
}

/// LLM 返回的大纲 JSON
///
/// `sources` 保持为原始 JSON，逐条宽松解析，单条坏数据不影响其它来源。
#[derive(Debug, Default, Deserialize)]
pub struct RawPlan {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "sections", alias = "headings")]
    pub outline: Vec<String>,
    #[serde(default, alias = "references")]
    pub sources: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub bibliography: Option<String>,
}
