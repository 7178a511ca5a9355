//! # 配置管理器
//!
//! 统一的配置管理接口，支持环境变量覆盖和手动重载

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{AppConfig, CacheConfig};
use crate::error::{BackendError, Result};

/// 环境变量覆盖前缀，例如 `BACKEND_CACHE_STORE` -> `cache.store`
const ENV_PREFIX: &str = "BACKEND_";

/// 配置管理器
pub struct ConfigManager {
    /// 配置文件路径；为空表示使用默认配置
    path: Option<PathBuf>,
    /// 当前配置
    config: Arc<RwLock<AppConfig>>,
    /// 环境变量覆盖映射
    env_overrides: HashMap<String, String>,
}

impl ConfigManager {
    /// 从指定文件创建配置管理器，文件不存在时使用默认配置
    pub fn from_file(path: Option<&Path>) -> Result<Self> {
        Self::with_overrides(path, Self::build_env_overrides())
    }

    /// 使用给定的覆盖映射创建配置管理器
    pub(crate) fn with_overrides(
        path: Option<&Path>,
        env_overrides: HashMap<String, String>,
    ) -> Result<Self> {
        let config = Self::load(path, &env_overrides)?;

        info!(
            config_path = ?path,
            env_overrides = env_overrides.len(),
            "配置管理器初始化完成"
        );

        Ok(Self {
            path: path.map(Path::to_path_buf),
            config: Arc::new(RwLock::new(config)),
            env_overrides,
        })
    }

    /// 获取当前配置
    pub async fn get_config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// 手动重载配置
    pub async fn reload(&self) -> Result<()> {
        let config = Self::load(self.path.as_deref(), &self.env_overrides)?;
        *self.config.write().await = config;
        info!("手动重载配置成功");
        Ok(())
    }

    fn load(path: Option<&Path>, overrides: &HashMap<String, String>) -> Result<AppConfig> {
        let mut config = match path {
            Some(path) => Self::load_config_file(path)?,
            None => AppConfig::default(),
        };

        Self::apply_env_overrides(&mut config, overrides)?;

        config.validate().map_err(BackendError::config)?;
        Ok(config)
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(BackendError::config(format!(
                "配置文件不存在: {}",
                path.display()
            )));
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            BackendError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            BackendError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}", path.display()),
                e,
            )
        })
    }

    /// 构建环境变量覆盖映射
    fn build_env_overrides() -> HashMap<String, String> {
        let overrides: HashMap<String, String> = env::vars()
            .filter(|(key, _)| key != "BACKEND_CONFIG_PATH")
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|path| (path.to_lowercase().replace('_', "."), value))
            })
            .collect();

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                path,
                if path.contains("secret") || path.contains("connection") {
                    "***"
                } else {
                    value.as_str()
                }
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();
        let backend = &mut config.backend;

        match parts.as_slice() {
            ["base", "url"] => backend.base_url = value.to_string(),
            ["listen", "host"] => backend.listen.host = value.to_string(),
            ["listen", "port"] => {
                backend.listen.port = value.parse().map_err(|e| {
                    BackendError::config_with_source(format!("无效的端口号: {value}"), e)
                })?;
            }
            ["database", "connection"] => backend.database.connection = value.to_string(),
            ["cache", "store"] => {
                backend.cache.get_or_insert_with(CacheConfig::default).store =
                    Some(value.to_string());
            }
            ["cache", "connection"] => {
                backend.cache.get_or_insert_with(CacheConfig::default).connection =
                    Some(value.to_string());
            }
            ["permission", "enabled"] => {
                config.permission.enabled = value.parse().map_err(|e| {
                    BackendError::config_with_source(format!("无效的布尔值: {value}"), e)
                })?;
            }
            _ => {
                warn!("未知的配置路径，忽略环境变量覆盖: {}", path);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_loads_file() {
        let file = write_config(
            r#"
            [backend.cache]
            store = "memcache"
            connection = "127.0.0.1:11211"
            "#,
        );

        let manager = ConfigManager::with_overrides(Some(file.path()), HashMap::new()).unwrap();
        let config = manager.get_config().await;
        let cache = config.backend.cache.unwrap();
        assert_eq!(cache.store.as_deref(), Some("memcache"));
        assert_eq!(cache.connection.as_deref(), Some("127.0.0.1:11211"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = ConfigManager::with_overrides(
            Some(Path::new("/definitely/not/here.toml")),
            HashMap::new(),
        );
        assert!(matches!(result, Err(BackendError::Config { .. })));
    }

    #[tokio::test]
    async fn test_override_creates_cache_section() {
        let manager =
            ConfigManager::with_overrides(None, overrides(&[("cache.store", "redis")])).unwrap();

        let config = manager.get_config().await;
        assert_eq!(
            config.backend.cache.and_then(|cache| cache.store).as_deref(),
            Some("redis")
        );
    }

    #[test]
    fn test_invalid_port_override_is_error() {
        let result =
            ConfigManager::with_overrides(None, overrides(&[("listen.port", "not-a-port")]));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reload_picks_up_file_changes() {
        let file = write_config("[backend]\nbaseUrl = \"http://one:7007\"\n");
        let manager = ConfigManager::with_overrides(Some(file.path()), HashMap::new()).unwrap();
        assert_eq!(manager.get_config().await.backend.base_url, "http://one:7007");

        std::fs::write(file.path(), "[backend]\nbaseUrl = \"http://two:7007\"\n").unwrap();
        manager.reload().await.unwrap();
        assert_eq!(manager.get_config().await.backend.base_url, "http://two:7007");
    }
}
