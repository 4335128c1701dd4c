//! 类型化环境变量
//!
//! 每个变量都是一个实现了 [`EnvVar`] 的零大小类型，负责解析与校验，
//! 由 [`crate::config::GateConfig::apply_env_overrides`] 在配置分层的最后一层读取。

use std::env;
use std::fmt;
use std::time::Duration;

use crate::config::{EvidenceMode, GateMode};

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::DEFAULT.ok_or_else(|| EnvError {
                variable: Self::NAME.to_string(),
                message: "Required environment variable not set".to_string(),
            }),
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "CONTENT_GATE_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 文本补全服务相关环境变量
pub mod provider {
    use super::*;

    /// 补全服务地址
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "CONTENT_GATE_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "OpenAI-compatible chat completions endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// API 密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "CONTENT_GATE_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "API key for the completion endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            let key = value.trim();
            if key.len() < 8 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API key must be at least 8 characters".to_string(),
                });
            }
            Ok(key.to_string())
        }
    }

    /// 主模型
    pub struct PrimaryModel;
    impl EnvVar<String> for PrimaryModel {
        const NAME: &'static str = "CONTENT_GATE_PRIMARY_MODEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Primary completion model";

        fn parse(value: &str) -> EnvResult<String> {
            let model = value.trim();
            if model.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Model name cannot be empty".to_string(),
                });
            }
            Ok(model.to_string())
        }
    }

    /// 备用模型列表
    pub struct FallbackModels;
    impl EnvVar<Vec<String>> for FallbackModels {
        const NAME: &'static str = "CONTENT_GATE_FALLBACK_MODELS";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str = "Fallback models, tried in order (comma-separated)";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            Ok(value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect())
        }
    }

    /// 单次调用超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "CONTENT_GATE_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Per-call completion timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }

            if seconds > 600 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout too long (max 600 seconds)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }
}

/// 质量闸门相关环境变量
pub mod quality {
    use super::*;

    /// 修订轮数上限
    pub struct MaxRevisionRounds;
    impl EnvVar<usize> for MaxRevisionRounds {
        const NAME: &'static str = "CONTENT_GATE_MAX_REVISION_ROUNDS";
        const DEFAULT: Option<usize> = None;
        const DESCRIPTION: &'static str = "Maximum generate/revise rounds per request";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 10)
        }
    }

    /// 时效性参考年份
    pub struct ReferenceYear;
    impl EnvVar<i32> for ReferenceYear {
        const NAME: &'static str = "CONTENT_GATE_REFERENCE_YEAR";
        const DEFAULT: Option<i32> = None;
        const DESCRIPTION: &'static str = "Year used by the freshness check (default: current year)";

        fn parse(value: &str) -> EnvResult<i32> {
            let year: i32 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a four-digit year".to_string(),
            })?;
            if !(1900..=2099).contains(&year) {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Year {} is out of range 1900-2099", year),
                });
            }
            Ok(year)
        }
    }

    /// 可提取性闸门模式
    pub struct ExtractabilityGate;
    impl EnvVar<GateMode> for ExtractabilityGate {
        const NAME: &'static str = "CONTENT_GATE_EXTRACTABILITY_GATE";
        const DEFAULT: Option<GateMode> = None;
        const DESCRIPTION: &'static str = "Extractability gate mode: hard, soft";

        fn parse(value: &str) -> EnvResult<GateMode> {
            value.parse().map_err(|message| EnvError {
                variable: Self::NAME.to_string(),
                message,
            })
        }
    }

    /// 证据收集模式
    pub struct EvidenceModeVar;
    impl EnvVar<EvidenceMode> for EvidenceModeVar {
        const NAME: &'static str = "CONTENT_GATE_EVIDENCE_MODE";
        const DEFAULT: Option<EvidenceMode> = None;
        const DESCRIPTION: &'static str = "Evidence mode: auto, off";

        fn parse(value: &str) -> EnvResult<EvidenceMode> {
            value.parse().map_err(|message| EnvError {
                variable: Self::NAME.to_string(),
                message,
            })
        }
    }

    /// 是否启用双语同步
    pub struct BilingualEnabled;
    impl EnvVar<bool> for BilingualEnabled {
        const NAME: &'static str = "CONTENT_GATE_BILINGUAL";
        const DEFAULT: Option<bool> = None;
        const DESCRIPTION: &'static str = "Enable bilingual synchronization";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    let entries: [(&str, &str); 11] = [
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (provider::ApiUrl::NAME, provider::ApiUrl::DESCRIPTION),
        (provider::ApiKey::NAME, provider::ApiKey::DESCRIPTION),
        (provider::PrimaryModel::NAME, provider::PrimaryModel::DESCRIPTION),
        (provider::FallbackModels::NAME, provider::FallbackModels::DESCRIPTION),
        (provider::RequestTimeout::NAME, provider::RequestTimeout::DESCRIPTION),
        (quality::MaxRevisionRounds::NAME, quality::MaxRevisionRounds::DESCRIPTION),
        (quality::ReferenceYear::NAME, quality::ReferenceYear::DESCRIPTION),
        (quality::ExtractabilityGate::NAME, quality::ExtractabilityGate::DESCRIPTION),
        (quality::EvidenceModeVar::NAME, quality::EvidenceModeVar::DESCRIPTION),
        (quality::BilingualEnabled::NAME, quality::BilingualEnabled::DESCRIPTION),
    ];
    for (name, description) in entries {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_parsing() {
        assert!(quality::BilingualEnabled::parse("true").unwrap());
        assert!(quality::BilingualEnabled::parse("YES").unwrap());
        assert!(!quality::BilingualEnabled::parse("0").unwrap());
        assert!(!quality::BilingualEnabled::parse("off").unwrap());
        assert!(quality::BilingualEnabled::parse("maybe").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(provider::ApiUrl::parse("http://localhost:8080/v1/chat/completions").is_ok());
        assert!(provider::ApiUrl::parse("ftp://example.com").is_err());
    }

    #[test]
    fn test_fallback_models_split() {
        let models = provider::FallbackModels::parse(" a , b,,c ").unwrap();
        assert_eq!(models, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_numeric_validation() {
        assert_eq!(quality::MaxRevisionRounds::parse("3").unwrap(), 3);
        assert!(quality::MaxRevisionRounds::parse("0").is_err());
        assert!(quality::MaxRevisionRounds::parse("99").is_err());
        assert!(quality::ReferenceYear::parse("1850").is_err());
        assert_eq!(quality::ReferenceYear::parse("2026").unwrap(), 2026);
        assert!(provider::RequestTimeout::parse("0").is_err());
    }

    #[test]
    fn test_gate_mode_variables() {
        assert_eq!(quality::ExtractabilityGate::parse("hard").unwrap(), GateMode::Hard);
        assert_eq!(quality::EvidenceModeVar::parse("OFF").unwrap(), EvidenceMode::Off);
        assert!(quality::EvidenceModeVar::parse("sometimes").is_err());
    }

    #[test]
    fn test_docs_list_every_variable() {
        let docs = generate_env_docs();
        assert!(docs.contains("CONTENT_GATE_API_KEY"));
        assert!(docs.contains("CONTENT_GATE_REFERENCE_YEAR"));
    }
}
