//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::env::{core::LogLevel, EnvVar};

/// 初始化全局日志订阅器
///
/// `RUST_LOG` 优先；未设置时使用 `CONTENT_GATE_LOG_LEVEL`（默认 info）。
/// 重复调用是安全的，第二次调用会被忽略。
pub fn init(verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        LogLevel::get_or_default("info".to_string())
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("content_gate={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
