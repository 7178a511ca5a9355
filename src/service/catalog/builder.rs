//! # 目录插件构建器
//!
//! 汇集插件环境（数据库、缓存、权限、地址发现），应用迁移并生成路由。

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::repository::CatalogRepository;
use super::router::{CatalogState, create_routes};
use crate::cache::{ClientOptions, PluginCacheConnection};
use crate::database::{PluginDatabaseManager, run_migrations};
use crate::error::Result;
use crate::service::discovery::PluginEndpointDiscovery;
use crate::service::permission::ServerPermissionClient;

/// 目录实体缓存的默认 TTL
pub const DEFAULT_ENTITY_CACHE_TTL: Duration = Duration::from_secs(60);

/// 插件运行环境
#[derive(Clone)]
pub struct PluginEnvironment {
    pub database: PluginDatabaseManager,
    pub cache: PluginCacheConnection,
    pub discovery: Arc<dyn PluginEndpointDiscovery>,
    pub permissions: Arc<ServerPermissionClient>,
}

/// 构建完成的目录插件
pub struct CatalogPlugin {
    pub router: Router,
    pub repository: CatalogRepository,
}

/// 目录插件构建器
pub struct CatalogBuilder {
    env: PluginEnvironment,
    cache_ttl: Duration,
}

impl CatalogBuilder {
    #[must_use]
    pub const fn create(env: PluginEnvironment) -> Self {
        Self {
            env,
            cache_ttl: DEFAULT_ENTITY_CACHE_TTL,
        }
    }

    /// 设置实体缓存 TTL
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub async fn build(self) -> Result<CatalogPlugin> {
        let db = self.env.database.get_client().await?;
        run_migrations(&db).await?;

        let repository = CatalogRepository::new(db);
        let cache = self
            .env
            .cache
            .get_client(ClientOptions::with_default_ttl(self.cache_ttl));

        let external_url = self
            .env
            .discovery
            .get_external_base_url(self.env.database.plugin_id())
            .await?;
        info!(
            plugin_id = self.env.database.plugin_id(),
            external_url,
            cache_ttl = ?self.cache_ttl,
            "目录插件构建完成"
        );

        let router = create_routes(CatalogState {
            repository: repository.clone(),
            cache,
            permissions: self.env.permissions,
        });

        Ok(CatalogPlugin { router, repository })
    }
}
