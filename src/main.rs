//! # Catalog Backend 主程序
//!
//! 以独立模式运行目录插件，用于本地开发和调试

use backend_common::{
    logging,
    service::{ServerOptions, start_standalone_server},
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "catalog-backend")]
#[command(about = "Standalone catalog backend with plugin-scoped caching")]
#[command(version)]
struct Cli {
    /// 监听端口；缺省使用 `backend.listen.port`（默认 7007）
    #[arg(short, long)]
    port: Option<u16>,

    /// 允许 http://localhost:3000 跨域访问
    #[arg(long)]
    enable_cors: bool,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别（`RUST_LOG` 优先）
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    let options = ServerOptions {
        port: cli.port,
        enable_cors: cli.enable_cors,
        config_path: cli.config,
    };

    info!(port = ?options.port, enable_cors = options.enable_cors, "正在启动目录服务");
    if let Err(e) = start_standalone_server(options).await {
        error!(error = %e, "目录服务启动失败");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_defaults_to_config() {
        let cli = Cli::parse_from(["catalog-backend"]);
        assert_eq!(cli.port, None);
        assert!(!cli.enable_cors);
    }

    #[test]
    fn test_explicit_port_overrides_config() {
        let cli = Cli::parse_from(["catalog-backend", "--port", "8080", "--enable-cors"]);
        assert_eq!(cli.port, Some(8080));
        assert!(cli.enable_cors);
    }
}
