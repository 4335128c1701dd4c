//! 配置管理器
//!
//! 分层加载：默认值 → 配置文件 → `CONTENT_GATE_*` 环境变量 → 类型化环境变量覆盖

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use super::constants;
use crate::error::{GateError, GateResult};

/// 评分引擎的闸门模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// 未达标即阻止定稿
    Hard,
    /// 仅在报告中提示
    Soft,
}

/// 证据收集模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceMode {
    Auto,
    Off,
}

impl std::str::FromStr for GateMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "hard" => Ok(GateMode::Hard),
            "soft" => Ok(GateMode::Soft),
            other => Err(format!("无效的闸门模式 '{}'，可选: hard, soft", other)),
        }
    }
}

impl std::str::FromStr for EvidenceMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(EvidenceMode::Auto),
            "off" => Ok(EvidenceMode::Off),
            other => Err(format!("无效的证据模式 '{}'，可选: auto, off", other)),
        }
    }
}

/// 质量闸门配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GateConfig {
    // 文本补全服务
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub primary_model: String,
    pub fallback_models: Vec<String>,
    pub request_timeout_secs: u64,
    pub retries_per_model: usize,
    pub retry_delay_ms: u64,
    pub overall_budget_secs: u64,
    pub degraded_cooldown_secs: u64,

    // 修订循环
    pub max_revision_rounds: usize,
    pub extractability_boost: bool,

    // 评分阈值与闸门
    pub seo_threshold: u32,
    pub geo_threshold: u32,
    pub extractability_threshold: u32,
    pub seo_gate: GateMode,
    pub extractability_gate: GateMode,
    pub evidence_mode: EvidenceMode,

    /// 时效性参考年份；为空时取当前年份
    #[serde(default)]
    pub reference_year: Option<i32>,

    // 双语
    pub bilingual_enabled: bool,
    pub chunk_sizes: Vec<usize>,

    // 存储
    pub output_dir: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,
            primary_model: constants::DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_models: constants::DEFAULT_FALLBACK_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            retries_per_model: constants::DEFAULT_RETRIES_PER_MODEL,
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY_MS,
            overall_budget_secs: constants::DEFAULT_OVERALL_BUDGET.as_secs(),
            degraded_cooldown_secs: constants::DEFAULT_DEGRADED_COOLDOWN.as_secs(),

            max_revision_rounds: constants::DEFAULT_MAX_REVISION_ROUNDS,
            extractability_boost: true,

            seo_threshold: constants::DEFAULT_SCORE_THRESHOLD,
            geo_threshold: constants::DEFAULT_SCORE_THRESHOLD,
            extractability_threshold: constants::DEFAULT_SCORE_THRESHOLD,
            seo_gate: GateMode::Hard,
            extractability_gate: GateMode::Soft,
            evidence_mode: EvidenceMode::Auto,
            reference_year: None,

            bilingual_enabled: true,
            chunk_sizes: constants::DEFAULT_CHUNK_SIZES.to_vec(),

            output_dir: constants::DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

impl GateConfig {
    /// 验证配置
    pub fn validate(&self) -> GateResult<()> {
        if self.max_revision_rounds == 0 {
            return Err(GateError::Config("修订轮数不能为0".to_string()));
        }
        if self.request_timeout_secs == 0 || self.overall_budget_secs == 0 {
            return Err(GateError::Config("超时时间必须大于0".to_string()));
        }
        for (name, value) in [
            ("seo_threshold", self.seo_threshold),
            ("geo_threshold", self.geo_threshold),
            ("extractability_threshold", self.extractability_threshold),
        ] {
            if value > 100 {
                return Err(GateError::Config(format!("{} 必须在 0..=100 之间: {}", name, value)));
            }
        }
        if self.chunk_sizes.is_empty() || self.chunk_sizes.contains(&0) {
            return Err(GateError::Config("分块大小阶梯不能为空或包含0".to_string()));
        }
        if self.primary_model.trim().is_empty() {
            return Err(GateError::Config("主模型名称不能为空".to_string()));
        }
        Ok(())
    }

    /// 应用类型化环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{provider, quality, EnvVar};

        if let Ok(api_url) = provider::ApiUrl::get() {
            tracing::info!("环境变量覆盖 API URL: {}", api_url);
            self.api_url = api_url;
        }
        if let Ok(api_key) = provider::ApiKey::get() {
            self.api_key = Some(api_key);
        }
        if let Ok(model) = provider::PrimaryModel::get() {
            self.primary_model = model;
        }
        if let Ok(models) = provider::FallbackModels::get() {
            self.fallback_models = models;
        }
        if let Ok(timeout) = provider::RequestTimeout::get() {
            self.request_timeout_secs = timeout.as_secs();
        }
        if let Ok(rounds) = quality::MaxRevisionRounds::get() {
            self.max_revision_rounds = rounds;
        }
        if let Ok(year) = quality::ReferenceYear::get() {
            self.reference_year = Some(year);
        }
        if let Ok(mode) = quality::ExtractabilityGate::get() {
            self.extractability_gate = mode;
        }
        if let Ok(mode) = quality::EvidenceModeVar::get() {
            self.evidence_mode = mode;
        }
        if let Ok(enabled) = quality::BilingualEnabled::get() {
            self.bilingual_enabled = enabled;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn overall_budget(&self) -> Duration {
        Duration::from_secs(self.overall_budget_secs)
    }

    pub fn degraded_cooldown(&self) -> Duration {
        Duration::from_secs(self.degraded_cooldown_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 实际使用的参考年份
    pub fn effective_reference_year(&self) -> i32 {
        use chrono::Datelike;
        self.reference_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }

    /// 以 TOML 文本输出当前配置（隐藏 API key）
    pub fn to_toml(&self) -> GateResult<String> {
        let mut redacted = self.clone();
        if redacted.api_key.is_some() {
            redacted.api_key = Some("***".to_string());
        }
        toml::to_string_pretty(&redacted)
            .map_err(|e| GateError::Config(format!("序列化配置失败: {}", e)))
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: GateConfig,
    config_path: Option<String>,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> GateResult<Self> {
        let (mut config, config_path) = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config, config_path })
    }

    /// 使用现成的配置（测试与嵌入场景）
    pub fn from_config(config: GateConfig) -> GateResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// 获取配置
    pub fn get_config(&self) -> &GateConfig {
        &self.config
    }

    /// 配置文件路径（若有）
    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    fn load_config() -> GateResult<(GateConfig, Option<String>)> {
        // 首先尝试加载 .env 文件
        if dotenv::dotenv().is_ok() {
            tracing::debug!("已加载 .env 文件");
        }

        let mut builder = Config::builder().add_source(Config::try_from(&GateConfig::default())?);

        let mut config_path = None;
        for path in constants::CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::with_name(&expanded));
                config_path = Some(expanded.to_string());
                tracing::info!("加载配置文件: {}", expanded);
                break;
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CONTENT_GATE")
                .prefix_separator("_")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("fallback_models")
                .with_list_parse_key("chunk_sizes"),
        );

        let config: GateConfig = builder.build()?.try_deserialize()?;
        tracing::info!(
            "加载的配置 - 主模型: {}, 备用模型: {:?}",
            config.primary_model,
            config.fallback_models
        );

        Ok((config, config_path))
    }
}
