//! 生成状态机
//!
//! DRAFTING → VALIDATING → REVISING（有限轮次，回到 VALIDATING）→ FINALIZING → DONE | FAILED
//!
//! 每条流水线只顺序执行自己的步骤，不共享可变状态；不同平台的流水线可以并发运行。
//! 定稿写入存储恰好一次，中间草稿从不对外暴露。

use std::sync::Arc;

use tracing::Instrument;

use super::assessment::{assess, Assessment, PipelineContext};
use super::objective::{select_best, Objective, WeightedDistance};
use super::prompts;
use super::PipelineState;
use crate::bilingual::BilingualLadder;
use crate::config::GateConfig;
use crate::error::{GateError, GateResult};
use crate::model::{ContentDraft, GenerationRequest, RevisionRound};
use crate::provider::{CompletionProvider, ModelRouter};
use crate::repair;
use crate::scoring::score_actions;
use crate::storage::ContentStore;
use crate::validators::{describe, ValidatorSuite};

/// 内容生成编排器
pub struct Orchestrator {
    config: GateConfig,
    router: Arc<ModelRouter>,
    store: Arc<dyn ContentStore>,
    suite: ValidatorSuite,
    objective: Box<dyn Objective>,
}

impl Orchestrator {
    /// 使用配置中的模型路由参数创建
    pub fn new(config: GateConfig, provider: Arc<dyn CompletionProvider>, store: Arc<dyn ContentStore>) -> Self {
        let router = Arc::new(ModelRouter::from_config(provider, &config));
        Self::with_router(config, router, store)
    }

    /// 使用现成的模型路由（多个编排器共享同一个降级状态时）
    pub fn with_router(config: GateConfig, router: Arc<ModelRouter>, store: Arc<dyn ContentStore>) -> Self {
        Self {
            config,
            router,
            store,
            suite: ValidatorSuite::new(),
            objective: Box::new(WeightedDistance::default()),
        }
    }

    pub fn with_objective(mut self, objective: Box<dyn Objective>) -> Self {
        self.objective = objective;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<ModelRouter> {
        &self.router
    }

    fn enter(&self, ctx: &PipelineContext, state: PipelineState) {
        metrics::counter!("content_gate_pipeline_states_total", "state" => state.as_str()).increment(1);
        tracing::info!("[{}] 进入状态 {}", ctx.key, state);
    }

    fn evaluate(&self, draft: &ContentDraft, ctx: &PipelineContext, bilingual: bool) -> Assessment {
        assess(draft, ctx, &self.suite, self.objective.as_ref(), bilingual)
    }

    fn fail(&self, ctx: &PipelineContext, error: GateError) -> GateError {
        self.enter(ctx, PipelineState::Failed);
        tracing::error!("[{}] 生成失败: {}", ctx.key, error);
        error
    }

    /// 运行单条流水线
    pub async fn run(&self, request: &GenerationRequest) -> GateResult<ContentDraft> {
        let span = tracing::info_span!(
            "pipeline",
            platform = %request.platform,
            variant = %request.variant,
            date = %request.date
        );
        self.run_pipeline(request).instrument(span).await
    }

    /// 并发运行多条互不相关的流水线
    pub async fn run_many(&self, requests: &[GenerationRequest]) -> Vec<GateResult<ContentDraft>> {
        futures::future::join_all(requests.iter().map(|request| self.run(request))).await
    }

    async fn run_pipeline(&self, request: &GenerationRequest) -> GateResult<ContentDraft> {
        let ctx = PipelineContext::new(&self.config, request);

        if let Some(existing) = self.store.read(&ctx.key).await? {
            tracing::info!("[{}] 已有定稿，直接返回", ctx.key);
            return Ok(existing);
        }

        // DRAFTING
        self.enter(&ctx, PipelineState::Drafting);
        let (system, user) =
            prompts::draft_prompts(request, &ctx.validation.profile, ctx.validation.reference_year);
        let raw = match self.router.complete(&system, &user).await {
            Ok(raw) => raw,
            Err(error) => return Err(self.fail(&ctx, error)),
        };
        let mut draft = ContentDraft::from_completion(&raw, &request.cta_url);

        // VALIDATING ⇄ REVISING
        let mut rounds: Vec<RevisionRound> = Vec::new();
        let mut issued: Vec<String> = Vec::new();
        let max_rounds = self.config.max_revision_rounds;
        for index in 0..=max_rounds {
            self.enter(&ctx, PipelineState::Validating);
            let assessment = self.evaluate(&draft, &ctx, false);
            let hard = assessment.hard_count();
            tracing::info!(
                "[{}] 第 {} 轮: 硬性问题 {} 个，距离 {:.1}",
                ctx.key,
                index,
                hard,
                assessment.distance
            );
            rounds.push(RevisionRound {
                index,
                candidate: draft.clone(),
                distance: assessment.distance,
                hard_issues: hard,
            });
            if hard == 0 || index == max_rounds {
                break;
            }

            self.enter(&ctx, PipelineState::Revising);
            metrics::counter!("content_gate_revision_rounds_total").increment(1);
            let issues = assessment.all_issues();
            let instructions = prompts::fix_instructions(&issues, request, &ctx.validation.profile);
            for instruction in &instructions {
                if !issued.contains(instruction) {
                    issued.push(instruction.clone());
                }
            }
            let revision = prompts::revision_prompt(&user, &draft, &issues, &instructions);
            match self.router.complete(&system, &revision).await {
                Ok(raw) => draft = ContentDraft::from_completion(&raw, &request.cta_url),
                Err(error) => {
                    tracing::warn!("[{}] 修订调用失败，保留已有候选: {}", ctx.key, error);
                    break;
                }
            }
        }

        // 对最优 AI 候选无条件执行确定性修复，作为额外候选
        let best_ai = select_best(&rounds)
            .map(|round| round.candidate.clone())
            .ok_or_else(|| GateError::Internal("没有任何候选".to_string()))?;
        let repaired = repair::apply_all(&best_ai, &ctx.repair);
        let repaired_assessment = self.evaluate(&repaired, &ctx, false);
        rounds.push(RevisionRound {
            index: rounds.len(),
            candidate: repaired,
            distance: repaired_assessment.distance,
            hard_issues: repaired_assessment.hard_count(),
        });

        let best = select_best(&rounds)
            .ok_or_else(|| GateError::Internal("没有任何候选".to_string()))?;
        tracing::info!(
            "[{}] 选中第 {} 个候选（距离 {:.1}，共 {} 个）",
            ctx.key,
            best.index,
            best.distance,
            rounds.len()
        );
        let mut chosen = best.candidate.clone();
        let candidate_count = rounds.len();

        if self.config.extractability_boost {
            chosen = self.boost_extractability(chosen, &ctx, &user, &system).await;
        }

        // FINALIZING
        self.enter(&ctx, PipelineState::Finalizing);
        let bilingual = self.config.bilingual_enabled;
        if bilingual {
            let ladder = BilingualLadder::new(&self.router, &self.config.chunk_sizes);
            if let Err(error) = ladder.synchronize(&mut chosen).await {
                return Err(self.fail(&ctx, error));
            }
        }

        let final_assessment = self.evaluate(&chosen, &ctx, bilingual);
        chosen.quality = Some(final_assessment.card.to_report(&ctx.scoring));
        let mut actions = request.improvement_actions.clone();
        actions.extend(issued.iter().cloned());
        chosen.ai_actions = Some(score_actions(&actions, &chosen.body));
        chosen.set_meta("candidates", candidate_count);
        chosen.set_meta("reference_year", ctx.validation.reference_year);

        let hard = final_assessment.hard_issues();
        if !hard.is_empty() {
            return Err(self.fail(&ctx, GateError::Validation { issues: describe(&hard) }));
        }

        if let Err(error) = self.store.write(&ctx.key, &chosen).await {
            return Err(self.fail(&ctx, error));
        }
        self.enter(&ctx, PipelineState::Done);
        Ok(chosen)
    }

    /// 其他闸门都已通过时，再尝试一次提高可提取性分数；
    /// 任何硬性问题回退或分数没有提高都丢弃该尝试
    async fn boost_extractability(
        &self,
        current: ContentDraft,
        ctx: &PipelineContext,
        user: &str,
        system: &str,
    ) -> ContentDraft {
        let before = self.evaluate(&current, ctx, false);
        if before.hard_count() > 0 || before.card.extractability_shortfall(&ctx.scoring) == 0 {
            return current;
        }

        tracing::info!("[{}] 尝试提高可提取性分数（当前 {}）", ctx.key, before.extractability());
        let prompt = prompts::extractability_prompt(user, &current, &before.card.extractability.issues);
        let raw = match self.router.complete(system, &prompt).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!("[{}] 可提取性强化调用失败: {}", ctx.key, error);
                return current;
            }
        };

        let mut boosted = ContentDraft::from_completion(&raw, &current.cta_url);
        if boosted.body_en.trim().is_empty() {
            boosted.title_en = current.title_en.clone();
            boosted.body_en = current.body_en.clone();
        }
        let boosted = repair::apply_all(&boosted, &ctx.repair);
        let after = self.evaluate(&boosted, ctx, false);
        if after.hard_count() == 0 && after.extractability() > before.extractability() {
            tracing::info!(
                "[{}] 可提取性分数 {} → {}",
                ctx.key,
                before.extractability(),
                after.extractability()
            );
            boosted
        } else {
            tracing::info!("[{}] 可提取性强化没有改进，保留原稿", ctx.key);
            current
        }
    }
}
