//! content-gate 命令行入口
//!
//! Usage:
//!   content-gate check draft.json --platform blog --keyword 內容行銷 --cta-url https://example.com/a
//!   content-gate repair draft.json --platform medium --keyword 內容行銷
//!   content-gate generate --topic 內容行銷 --keyword 內容行銷 --cta-url https://example.com/a -p blog -p medium
//!   content-gate config

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use content_gate::orchestrator::{assess, PipelineContext, WeightedDistance};
use content_gate::repair::apply_all;
use content_gate::validators::ValidatorSuite;
use content_gate::{
    logging, ArticleType, ConfigManager, ContentDraft, ContentStore, ContentVariant, FileStore, GenerationRequest,
    HttpCompletionProvider, Orchestrator, Platform,
};

#[derive(Parser, Debug)]
#[command(name = "content-gate", version)]
#[command(about = "Iterative quality gate for AI-drafted marketing articles")]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 校验并评分一份草稿（JSON），有硬性问题时以非零状态退出
    Check {
        /// 草稿 JSON 文件
        draft: PathBuf,
        #[command(flatten)]
        target: Target,
    },
    /// 对草稿执行确定性修复并输出结果 JSON
    Repair {
        draft: PathBuf,
        #[command(flatten)]
        target: Target,
    },
    /// 调用补全服务生成文章，每个平台一条流水线
    Generate {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        keyword: String,
        #[arg(long)]
        cta_url: String,
        /// 目标平台，可重复
        #[arg(short, long = "platform", required = true)]
        platforms: Vec<Platform>,
        #[arg(long, default_value = "default")]
        variant: ContentVariant,
        #[arg(long, default_value = "general")]
        article_type: ArticleType,
        /// 发布日期（YYYY-MM-DD），默认今天
        #[arg(long)]
        date: Option<NaiveDate>,
        /// 允许保留的次要链接域名
        #[arg(long = "allow-domain")]
        allow_domains: Vec<String>,
        /// 上一轮分析给出的改进动作
        #[arg(long = "action")]
        actions: Vec<String>,
    },
    /// 输出当前生效的配置（TOML）
    Config,
}

/// 单篇草稿的目标平台与关键词
#[derive(Args, Debug)]
struct Target {
    #[arg(short, long, default_value = "blog")]
    platform: Platform,
    #[arg(long, default_value = "default")]
    variant: ContentVariant,
    #[arg(long, default_value = "general")]
    article_type: ArticleType,
    #[arg(long)]
    keyword: String,
    /// 主要链接；未指定时使用草稿中的 cta_url
    #[arg(long)]
    cta_url: Option<String>,
}

impl Target {
    fn request(&self, draft: &ContentDraft) -> GenerationRequest {
        GenerationRequest {
            topic: self.keyword.clone(),
            keyword: self.keyword.clone(),
            platform: self.platform,
            variant: self.variant,
            article_type: self.article_type,
            cta_url: self.cta_url.clone().unwrap_or_else(|| draft.cta_url.clone()),
            secondary_allow_list: Vec::new(),
            date: chrono::Local::now().date_naive(),
            improvement_actions: Vec::new(),
        }
    }
}

fn load_draft(path: &Path) -> Result<ContentDraft, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("无法读取 {}: {}", path.display(), e))?;
    let draft: ContentDraft = serde_json::from_str(&raw)?;
    Ok(draft)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let manager = ConfigManager::new()?;
    let config = manager.get_config().clone();

    match cli.command {
        Command::Check { draft, target } => {
            let mut draft = load_draft(&draft)?;
            let request = target.request(&draft);
            if draft.cta_url.is_empty() {
                draft.cta_url = request.cta_url.clone();
            }
            let ctx = PipelineContext::new(&config, &request);
            let assessment = assess(
                &draft,
                &ctx,
                &ValidatorSuite::new(),
                &WeightedDistance::default(),
                draft.has_secondary(),
            );
            let report = serde_json::json!({
                "issues": assessment.all_issues(),
                "quality": assessment.card.to_report(&ctx.scoring),
                "distance": assessment.distance,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            if assessment.hard_count() > 0 {
                return Ok(ExitCode::from(2));
            }
        }
        Command::Repair { draft, target } => {
            let mut draft = load_draft(&draft)?;
            let request = target.request(&draft);
            draft.cta_url = request.cta_url.clone();
            let ctx = PipelineContext::new(&config, &request);
            let repaired = apply_all(&draft, &ctx.repair);
            println!("{}", serde_json::to_string_pretty(&repaired)?);
        }
        Command::Generate {
            topic,
            keyword,
            cta_url,
            platforms,
            variant,
            article_type,
            date,
            allow_domains,
            actions,
        } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let requests: Vec<GenerationRequest> = platforms
                .into_iter()
                .map(|platform| GenerationRequest {
                    topic: topic.clone(),
                    keyword: keyword.clone(),
                    platform,
                    variant,
                    article_type,
                    cta_url: cta_url.clone(),
                    secondary_allow_list: allow_domains.clone(),
                    date,
                    improvement_actions: actions.clone(),
                })
                .collect();

            let store = FileStore::from_config(&config);
            tracing::info!("输出目录: {}", store.root().display());
            let store: Arc<dyn ContentStore> = Arc::new(store);
            let provider = Arc::new(HttpCompletionProvider::from_config(&config));
            let orchestrator = Orchestrator::new(config, provider, store);

            let mut failed = 0;
            for (request, result) in requests.iter().zip(orchestrator.run_many(&requests).await) {
                match result {
                    Ok(draft) => {
                        let quality = draft.quality.as_ref();
                        println!(
                            "{}/{}: {} (SEO {} / GEO {})",
                            request.platform,
                            request.variant,
                            draft.title,
                            quality.map(|q| q.seo_score).unwrap_or_default(),
                            quality.map(|q| q.geo_score).unwrap_or_default()
                        );
                    }
                    Err(error) => {
                        failed += 1;
                        eprintln!("{}/{}: {}", request.platform, request.variant, error);
                    }
                }
            }
            if failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Config => {
            if let Some(path) = manager.config_path() {
                eprintln!("# {}", path);
            }
            print!("{}", config.to_toml()?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
