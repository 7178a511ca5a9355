//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod app_config;
mod database;
mod manager;

pub use app_config::{
    AppConfig, AuthConfig, AuthKey, BackendConfig, CacheConfig, CorsConfig, ListenConfig,
    PermissionConfig,
};
pub use database::{DatabaseConfig, SQLITE_MEMORY};
pub use manager::ConfigManager;

use std::env;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/app-config.toml";

/// 加载后端配置
///
/// 查找顺序：显式路径 -> `BACKEND_CONFIG_PATH` -> 默认路径。
/// 前两者指定的文件必须存在；默认路径不存在时使用内置默认配置。
pub async fn load_backend_config(explicit: Option<&Path>) -> crate::error::Result<AppConfig> {
    let path = resolve_config_path(explicit);
    let manager = ConfigManager::from_file(path.as_deref())?;
    Ok(manager.get_config().await)
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = env::var("BACKEND_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Some(default_path.to_path_buf())
    } else {
        tracing::warn!(
            path = DEFAULT_CONFIG_PATH,
            "未找到默认配置文件，使用内置默认配置"
        );
        None
    }
}
