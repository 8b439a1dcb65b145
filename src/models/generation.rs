use std::fmt::Display;

/// 流水线阶段（每个阶段对应一次 LLM 请求）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// 完成作业
    Worksheet,
    /// 大纲与参考文献计划
    Outline,
    /// 单个章节正文
    Section {
        /// 章节序号（从1开始）
        index: usize,
        heading: String,
        /// 本章节的目标字数
        budget: usize,
    },
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Worksheet => write!(f, "worksheet"),
            Stage::Outline => write!(f, "outline"),
            Stage::Section {
                index,
                heading,
                budget,
            } => write!(f, "section#{} '{}' ({} words)", index, heading, budget),
        }
    }
}

/// 一次生成请求：提示词 + 采样参数
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub stage: Stage,
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(stage: Stage, prompt: impl Into<String>) -> Self {
        Self {
            stage,
            system: None,
            prompt: prompt.into(),
            temperature: 0.4,
            max_tokens: 2000,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}
