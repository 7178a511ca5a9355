//! # 日志配置模块
//!
//! 基于 `tracing-subscriber` 的全局日志初始化。`RUST_LOG` 优先于命令行传入的级别。

use std::env;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 默认日志级别
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// 构造默认过滤规则，屏蔽数据库查询的逐条日志
#[must_use]
pub fn default_filter(level: Option<&str>) -> String {
    let level = level.unwrap_or(DEFAULT_LOG_LEVEL);
    format!("{level},sqlx::query=off,sea_orm::query=warn,sqlx=warn,hyper=warn")
}

/// 初始化全局日志
///
/// 重复调用时保留第一次的配置。
pub fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!(
            rust_log = env::var("RUST_LOG").ok(),
            "日志系统初始化完成"
        );
    }
}
