//! 论文生成流程 - 流程层
//!
//! 流程顺序（严格串行，每一步都等上一步的 LLM 回复）：
//! 1. 大纲计划：标题 + 章节标题 + 参考文献（解析失败时使用默认计划）
//! 2. 逐章节生成：累计字数达到目标后停止，不再请求后续章节
//! 3. 拼装：标题 → 各章节 → 参考文献，得到一段 Markdown
//!
//! 章节预算为 `min(上限, 剩余字数 + 余量)`：允许单个章节略微超出，
//! 让累计字数逼近目标，而不是把最后一节截断到刚好够数。

use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::{CitationStyle, GenerationRequest, OutlinePlan, PlanOutcome, RawPlan, Stage};
use crate::services::bibliography::{
    format_bibliography, format_raw_bibliography, records_from_values, BibliographyBlock,
};
use crate::services::word_counter::count_words;
use crate::services::TextProvider;
use crate::utils::json::extract_json_object;
use crate::workflow::compose_ctx::ComposeCtx;
use crate::workflow::prompts;

/// 单个章节的字数上限
pub const SECTION_WORD_CAP: usize = 800;
/// 允许单个章节超出剩余字数的余量
pub const SECTION_SLACK: usize = 200;

/// 默认计划的标题
pub const FALLBACK_TITLE: &str = "Academic Essay";
/// 默认计划的章节
pub const FALLBACK_OUTLINE: [&str; 5] = [
    "Introduction",
    "Background",
    "Main Argument",
    "Counterarguments",
    "Conclusion",
];

const OUTLINE_TEMPERATURE: f32 = 0.4;
const OUTLINE_MAX_TOKENS: u32 = 2000;
const SECTION_TEMPERATURE: f32 = 0.4;

/// 一个已生成的章节
#[derive(Debug, Clone)]
pub struct SectionDraft {
    pub heading: String,
    pub budget: usize,
    pub body: String,
    pub words: usize,
}

/// 拼装好的论文
#[derive(Debug, Clone)]
pub struct EssayDraft {
    pub plan: PlanOutcome,
    pub sections: Vec<SectionDraft>,
    pub total_words: usize,
    pub markdown: String,
}

/// 论文生成流程
///
/// - provider 在调用时注入，流程本身不持有任何资源
/// - 累计字数只属于一次 `run`，不跨请求共享
pub struct EssayFlow<'a> {
    provider: &'a dyn TextProvider,
}

impl<'a> EssayFlow<'a> {
    pub fn new(provider: &'a dyn TextProvider) -> Self {
        Self { provider }
    }

    pub async fn run(&self, worksheet: &str, ctx: &ComposeCtx) -> AppResult<EssayDraft> {
        // ========== 阶段 1: 大纲 ==========
        let plan = self.generate_outline(worksheet, ctx).await?;

        // ========== 阶段 2: 逐章节生成 ==========
        let sections = self.generate_sections(plan.plan(), worksheet, ctx).await?;
        let total_words = sections.iter().map(|s| s.words).sum();

        // ========== 阶段 3: 拼装 ==========
        let markdown = assemble(plan.plan(), &sections);
        info!(
            "{} ✓ 论文拼装完成: {} 个章节, 共 {} 词",
            ctx,
            sections.len(),
            total_words
        );

        Ok(EssayDraft {
            plan,
            sections,
            total_words,
            markdown,
        })
    }

    async fn generate_outline(&self, worksheet: &str, ctx: &ComposeCtx) -> AppResult<PlanOutcome> {
        info!("{} 🗂️ 正在生成大纲与参考文献...", ctx);

        let request = GenerationRequest::new(
            Stage::Outline,
            prompts::outline_prompt(worksheet, ctx.style, ctx.target_words),
        )
        .with_system(prompts::ESSAY_SYSTEM)
        .with_sampling(OUTLINE_TEMPERATURE, OUTLINE_MAX_TOKENS);

        let reply = self.provider.generate(&request).await?;
        let outcome = parse_plan(&reply, ctx.style);

        match &outcome {
            PlanOutcome::Parsed(plan) => info!(
                "{} ✓ 大纲: '{}'，{} 个章节",
                ctx,
                plan.title,
                plan.outline.len()
            ),
            PlanOutcome::FallbackUsed(_) => {
                warn!("{} ⚠️ 大纲解析失败，使用默认计划", ctx)
            }
        }
        Ok(outcome)
    }

    async fn generate_sections(
        &self,
        plan: &OutlinePlan,
        worksheet: &str,
        ctx: &ComposeCtx,
    ) -> AppResult<Vec<SectionDraft>> {
        let target = ctx.target_words;
        let mut accumulated = 0usize;
        let mut sections = Vec::new();

        for (index, heading) in plan.outline.iter().enumerate() {
            if accumulated >= target {
                info!(
                    "{} 已达到目标字数 ({}/{})，跳过剩余 {} 个章节",
                    ctx,
                    accumulated,
                    target,
                    plan.outline.len() - index
                );
                break;
            }

            let budget = section_budget(target, accumulated);
            let stage = Stage::Section {
                index: index + 1,
                heading: heading.clone(),
                budget,
            };
            info!("{} ✍️ {}", ctx, stage);

            let request = GenerationRequest::new(
                stage,
                prompts::section_prompt(
                    &plan.title,
                    heading,
                    budget,
                    worksheet,
                    &plan.bibliography,
                    ctx.style,
                ),
            )
            .with_system(prompts::ESSAY_SYSTEM)
            .with_sampling(SECTION_TEMPERATURE, section_max_tokens(budget));

            let reply = self.provider.generate(&request).await?;
            let body = strip_leading_heading(&reply, heading);
            let words = count_words(&body);
            accumulated += words;

            debug!(
                "{} 章节 '{}' 完成: {} 词 (预算 {}), 累计 {}",
                ctx, heading, words, budget, accumulated
            );

            sections.push(SectionDraft {
                heading: heading.clone(),
                budget,
                body,
                words,
            });
        }

        if accumulated < target {
            warn!(
                "{} ⚠️ 大纲已用完，累计 {} 词，未达到目标 {}",
                ctx, accumulated, target
            );
        }

        Ok(sections)
    }
}

/// 本章节请求的字数：`min(上限, 剩余 + 余量)`
pub fn section_budget(target: usize, accumulated: usize) -> usize {
    let remaining = target.saturating_sub(accumulated);
    SECTION_WORD_CAP.min(remaining + SECTION_SLACK)
}

/// 章节请求的 token 上限：约两倍字数，至少 512
fn section_max_tokens(budget: usize) -> u32 {
    u32::try_from(budget * 2).unwrap_or(u32::MAX).max(512)
}

/// 解析大纲回复
///
/// 找不到 JSON、JSON 非法、或者没有任何章节标题时，返回 [`PlanOutcome::FallbackUsed`]。
pub fn parse_plan(reply: &str, style: CitationStyle) -> PlanOutcome {
    let Some(json) = extract_json_object(reply) else {
        debug!("大纲回复中没有 JSON 对象");
        return PlanOutcome::FallbackUsed(fallback_plan(style));
    };

    let raw: RawPlan = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("大纲 JSON 解析失败: {}", e);
            return PlanOutcome::FallbackUsed(fallback_plan(style));
        }
    };

    let outline: Vec<String> = raw
        .outline
        .iter()
        .map(|heading| clean_heading(heading))
        .filter(|heading| !heading.is_empty())
        .collect();
    if outline.is_empty() {
        debug!("大纲 JSON 中没有章节");
        return PlanOutcome::FallbackUsed(fallback_plan(style));
    }

    let title = raw
        .title
        .as_deref()
        .map(clean_heading)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let block = match (raw.sources, raw.bibliography) {
        (Some(sources), _) if !sources.is_empty() => {
            format_bibliography(&records_from_values(sources), style)
        }
        (_, Some(text)) if !text.trim().is_empty() => format_raw_bibliography(&text, style),
        _ => {
            warn!("⚠️ 大纲中没有来源，参考文献只有标题");
            BibliographyBlock::empty(style)
        }
    };

    PlanOutcome::Parsed(OutlinePlan {
        title,
        outline,
        bibliography: block.to_markdown(),
    })
}

/// 默认计划：固定标题、固定章节、只有标题的参考文献
pub fn fallback_plan(style: CitationStyle) -> OutlinePlan {
    OutlinePlan {
        title: FALLBACK_TITLE.to_string(),
        outline: FALLBACK_OUTLINE.iter().map(|s| s.to_string()).collect(),
        bibliography: BibliographyBlock::empty(style).to_markdown(),
    }
}

/// 拼装：标题行、各章节（二级标题 + 正文）、参考文献
pub fn assemble(plan: &OutlinePlan, sections: &[SectionDraft]) -> String {
    let mut out = format!("# {}\n\n", plan.title);
    for section in sections {
        out.push_str(&format!("## {}\n\n{}\n\n", section.heading, section.body.trim()));
    }
    out.push_str(&plan.bibliography);
    out
}

/// 去掉 `## ` / `1. ` 之类的前缀
fn clean_heading(heading: &str) -> String {
    let trimmed = heading.trim().trim_start_matches('#').trim();
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    let trimmed = if digits > 0 {
        trimmed[digits..]
            .strip_prefix('.')
            .or_else(|| trimmed[digits..].strip_prefix(')'))
            .map(str::trim_start)
            .unwrap_or(trimmed)
    } else {
        trimmed
    };
    trimmed.to_string()
}

/// 章节正文第一行非空内容重复了章节标题时去掉该行
fn strip_leading_heading(body: &str, heading: &str) -> String {
    let body = body.trim();
    let (first, rest) = body.split_once('\n').unwrap_or((body, ""));
    let first_bare = first.trim().trim_start_matches('#').trim().trim_matches('*').trim();
    if first_bare.eq_ignore_ascii_case(heading.trim()) {
        rest.trim().to_string()
    } else {
        body.to_string()
    }
}
