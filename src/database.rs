//! # 数据库模块
//!
//! 插件作用域的数据库连接和迁移管理

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{BackendError, Result};

/// 数据库管理器
///
/// 内存 SQLite 下每个插件拥有独立的数据库；文件 SQLite 下所有插件共享同一个文件。
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    config: DatabaseConfig,
}

impl DatabaseManager {
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if config.client != "sqlite" {
            return Err(BackendError::config(format!(
                "不支持的数据库类型: {}，目前只支持 sqlite",
                config.client
            )));
        }

        Ok(Self {
            config: config.clone(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// 获取插件作用域的数据库管理器
    #[must_use]
    pub fn for_plugin(&self, plugin_id: impl Into<String>) -> PluginDatabaseManager {
        PluginDatabaseManager {
            plugin_id: plugin_id.into(),
            config: self.config.clone(),
            connection: Arc::new(OnceCell::new()),
        }
    }
}

/// 插件数据库管理器，连接在首次获取时建立并复用
#[derive(Debug, Clone)]
pub struct PluginDatabaseManager {
    plugin_id: String,
    config: DatabaseConfig,
    connection: Arc<OnceCell<DatabaseConnection>>,
}

impl PluginDatabaseManager {
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// 获取数据库连接
    pub async fn get_client(&self) -> Result<DatabaseConnection> {
        let connection = self
            .connection
            .get_or_try_init(|| init_database(&self.config, &self.plugin_id))
            .await?;
        Ok(connection.clone())
    }
}

/// 初始化数据库连接
pub async fn init_database(config: &DatabaseConfig, plugin_id: &str) -> Result<DatabaseConnection> {
    let url = config.url();
    info!(plugin_id, in_memory = config.is_in_memory(), "正在连接数据库");

    if !config.is_in_memory() {
        ensure_parent_dir(&url)?;
    }

    let mut options = ConnectOptions::new(url);
    // 内存 SQLite 的每个连接都是独立的数据库，只能使用单连接
    let max_connections = if config.is_in_memory() {
        1
    } else {
        config.max_connections.max(1)
    };
    options
        .max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await.map_err(|e| {
        BackendError::database_with_source(format!("插件 {plugin_id} 连接数据库失败"), e)
    })?;

    info!(plugin_id, "数据库连接成功");
    Ok(db)
}

/// 确保 SQLite 文件所在目录存在
fn ensure_parent_dir(url: &str) -> Result<()> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("创建数据库目录: {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    info!("开始运行数据库迁移...");

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            info!("数据库迁移完成");
            Ok(())
        }
        Err(e) => {
            error!("数据库迁移失败: {}", e);
            Err(BackendError::database_with_source("数据库迁移失败", e))
        }
    }
}

/// 检查数据库状态
pub async fn check_database_status(db: &DatabaseConnection) -> std::result::Result<usize, DbErr> {
    let pending = ::migration::Migrator::get_pending_migrations(db).await?;

    if pending.is_empty() {
        debug!("所有迁移都已应用");
    } else {
        warn!("有 {} 个待应用的迁移", pending.len());
    }

    Ok(pending.len())
}
