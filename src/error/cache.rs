use thiserror::Error;

/// 描述缓存存储（内存 / memcache / Redis）相关的错误。
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("未知的缓存存储: {store}")]
    UnknownStore { store: String },

    #[error("无效的 {store} 连接字符串 `{connection}`: {reason}")]
    InvalidConnection {
        store: &'static str,
        connection: String,
        reason: String,
    },

    #[error("缓存连接失败: {0}")]
    Connection(String),

    #[error("缓存操作失败: {0}")]
    Operation(String),

    #[error("缓存值序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis 客户端错误: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Memcache 客户端错误: {0}")]
    Memcache(#[from] memcache::MemcacheError),
}

impl CacheError {
    /// 便捷构造函数，统一字符串转换。
    pub fn unknown_store(store: impl Into<String>) -> Self {
        Self::UnknownStore {
            store: store.into(),
        }
    }

    pub fn invalid_connection(
        store: &'static str,
        connection: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConnection {
            store,
            connection: connection.into(),
            reason: reason.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation(message.into())
    }

    /// 配置阶段的错误（启动时即失败，不可恢复）
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownStore { .. } | Self::InvalidConnection { .. }
        )
    }
}

/// 缓存层的 `Result` 别名
pub type CacheResult<T> = std::result::Result<T, CacheError>;
