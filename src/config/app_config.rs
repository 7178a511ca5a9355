//! # 应用配置结构定义
//!
//! 配置文件采用 TOML 格式，键名与 `app-config` 约定保持一致（camelCase），
//! 例如 `backend.cache.useRedisSets`。

use serde::{Deserialize, Serialize};

use super::DatabaseConfig;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 后端服务配置
    pub backend: BackendConfig,
    /// 权限框架配置
    pub permission: PermissionConfig,
}

/// `backend` 配置段
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    /// 对外暴露的基础地址
    pub base_url: String,
    /// 监听配置
    pub listen: ListenConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 缓存配置；整个配置段缺失时使用内存存储
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
    /// 服务间认证配置
    pub auth: AuthConfig,
    /// CORS 配置；开启 CORS 时使用，缺省允许 `http://localhost:3000`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsConfig>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7007".to_string(),
            listen: ListenConfig::default(),
            database: DatabaseConfig::default(),
            cache: None,
            auth: AuthConfig::default(),
            cors: None,
        }
    }
}

/// 监听地址配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7007,
        }
    }
}

/// `backend.cache` 配置段
///
/// `store` 保留为字符串，由 `CacheManager::from_config` 解析，
/// 这样未知的存储类型会以缓存层错误的形式暴露，而不是 TOML 解析错误。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// 存储类型：memory | memcache | redis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    /// 存储连接串（memcache 为 host:port，Redis 为 URI）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    /// Redis 是否使用 set 记录命名空间下的键
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_redis_sets: Option<bool>,
}

/// `backend.auth` 配置段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 服务令牌签名密钥，第一个用于签发，全部用于校验
    pub keys: Vec<AuthKey>,
}

/// 单个签名密钥
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthKey {
    pub secret: String,
}

/// `backend.cors` 配置段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许跨域访问的来源
    pub origin: String,
}

/// `permission` 配置段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    pub enabled: bool,
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.backend.listen.port == 0 {
            return Err("backend.listen.port 必须大于 0".to_string());
        }

        if url::Url::parse(&self.backend.base_url).is_err() {
            return Err(format!(
                "backend.baseUrl 不是有效的 URL: {}",
                self.backend.base_url
            ));
        }

        if self.backend.database.connection.is_empty() {
            return Err("backend.database.connection 不能为空".to_string());
        }

        if self.backend.auth.keys.iter().any(|key| key.secret.is_empty()) {
            return Err("backend.auth.keys 中的 secret 不能为空".to_string());
        }

        Ok(())
    }
}
