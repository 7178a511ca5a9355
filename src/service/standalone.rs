//! # 独立目录服务
//!
//! 启动流程：加载配置 -> 内存数据库 -> 地址发现 / 服务令牌 / 权限客户端
//! -> 插件缓存 -> 迁移并构建目录 -> 挂载到 `/catalog`。

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::catalog::{CATALOG_PLUGIN_ID, CatalogBuilder, PluginEnvironment};
use super::discovery::HostDiscovery;
use super::permission::ServerPermissionClient;
use super::token::ServerTokenManager;
use crate::cache::{CacheManager, CacheManagerOptions};
use crate::config::{AppConfig, DatabaseConfig, load_backend_config};
use crate::database::DatabaseManager;
use crate::error::{BackendError, Context, Result};

/// 开启 CORS 且未配置 `backend.cors.origin` 时允许的前端地址
pub const DEV_FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// 独立服务启动参数
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// 监听端口；为空时使用 `backend.listen.port`
    pub port: Option<u16>,
    pub enable_cors: bool,
    pub config_path: Option<PathBuf>,
}

impl ServerOptions {
    /// 实际监听端口：命令行优先，其次为配置（含环境变量覆盖）
    #[must_use]
    pub fn resolve_port(&self, config: &AppConfig) -> u16 {
        self.port.unwrap_or(config.backend.listen.port)
    }
}

/// 启动独立目录服务，直到收到 Ctrl-C
pub async fn start_standalone_server(options: ServerOptions) -> Result<()> {
    let config = load_backend_config(options.config_path.as_deref())
        .await
        .context("加载后端配置失败")?;

    let router = create_standalone_router(&config, options.enable_cors).await?;

    let port = options.resolve_port(&config);
    let ip = config.backend.listen.host.parse::<std::net::IpAddr>().map_err(|e| {
        BackendError::config_with_source(
            format!("无效的监听地址: {}", config.backend.listen.host),
            e,
        )
    })?;
    let addr = SocketAddr::new(ip, port);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| BackendError::server_start_with_source(format!("监听 {addr} 失败"), e))?;
    info!(%addr, "目录服务已启动");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| BackendError::server_start_with_source("目录服务运行失败", e))?;

    info!("目录服务已停止");
    Ok(())
}

/// 按配置组装完整的服务路由
pub async fn create_standalone_router(config: &AppConfig, enable_cors: bool) -> Result<Router> {
    // 独立模式始终使用内存数据库
    let database = DatabaseManager::from_config(&DatabaseConfig::in_memory())?
        .for_plugin(CATALOG_PLUGIN_ID);

    let discovery = Arc::new(HostDiscovery::from_config(config)?);
    let token_manager = Arc::new(ServerTokenManager::from_config(config));
    let permissions = Arc::new(ServerPermissionClient::from_config(
        config,
        discovery.clone(),
        token_manager,
    )?);

    let cache = CacheManager::from_config(config, CacheManagerOptions::default())?
        .for_plugin(CATALOG_PLUGIN_ID);

    let catalog = CatalogBuilder::create(PluginEnvironment {
        database,
        cache,
        discovery,
        permissions,
    })
    .build()
    .await
    .context("构建目录插件失败")?;

    let mut app = Router::new()
        .nest(&format!("/{CATALOG_PLUGIN_ID}"), catalog.router)
        .route("/healthcheck", get(health_check))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app = app.layer(cors_layer(config)?);
    }

    Ok(app)
}

fn cors_layer(config: &AppConfig) -> Result<CorsLayer> {
    let origin = config
        .backend
        .cors
        .as_ref()
        .map_or(DEV_FRONTEND_ORIGIN, |cors| cors.origin.as_str());
    let origin = HeaderValue::from_str(origin).map_err(|e| {
        BackendError::config_with_source(format!("无效的 CORS 来源: {origin}"), e)
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .allow_credentials(true))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "监听退出信号失败");
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，正在关闭目录服务");
}
