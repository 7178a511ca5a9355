//! # 插件缓存客户端
//!
//! 每个客户端绑定一个插件命名空间，所有键都会自动加上前缀。
//! 存储错误会通知已注册的错误监听器，同时返回给调用方。

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::keys;
use super::store::{CacheStore, StoreScope};
use crate::error::{CacheError, CacheResult};

/// 错误监听回调
pub type ErrorHandler = Arc<dyn Fn(&CacheError) + Send + Sync>;

/// 插件缓存客户端
#[derive(Clone)]
pub struct CacheClient {
    store: Arc<CacheStore>,
    namespace: String,
    default_ttl: Option<Duration>,
    use_redis_sets: Option<bool>,
    listeners: Vec<ErrorHandler>,
}

impl fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheClient")
            .field("store", &self.store.kind())
            .field("namespace", &self.namespace)
            .field("default_ttl", &self.default_ttl)
            .field("use_redis_sets", &self.use_redis_sets)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CacheClient {
    pub(crate) fn new(
        store: Arc<CacheStore>,
        namespace: impl Into<String>,
        default_ttl: Option<Duration>,
        use_redis_sets: Option<bool>,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            default_ttl,
            use_redis_sets,
            listeners: Vec::new(),
        }
    }

    /// 注册错误监听器
    pub fn on_error(&mut self, handler: ErrorHandler) -> &mut Self {
        self.listeners.push(handler);
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub const fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Redis 是否使用 set 记录命名空间成员；非 Redis 存储为 `None`
    #[must_use]
    pub const fn use_redis_sets(&self) -> Option<bool> {
        self.use_redis_sets
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    #[must_use]
    pub fn error_listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// 读取值，未命中或已过期返回 `None`
    pub async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let full_key = keys::namespaced(&self.namespace, key);
        let raw = self.observe(self.store.get(&full_key).await)?;

        match raw {
            Some(raw) => {
                debug!(namespace = %self.namespace, key, "缓存命中");
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => {
                debug!(namespace = %self.namespace, key, "缓存未命中");
                Ok(None)
            }
        }
    }

    /// 写入值
    ///
    /// `ttl` 为空时使用客户端默认 TTL；TTL 为零表示永不过期。
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        let full_key = keys::namespaced(&self.namespace, key);
        let raw = serde_json::to_string(value)?;
        let ttl = ttl.or(self.default_ttl).filter(|ttl| !ttl.is_zero());

        self.observe(self.store.set(self.scope(), &full_key, raw, ttl).await)
    }

    /// 删除键，返回键是否存在
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let full_key = keys::namespaced(&self.namespace, key);
        self.observe(self.store.delete(self.scope(), &full_key).await)
    }

    /// 清空当前命名空间
    pub async fn clear(&self) -> CacheResult<()> {
        self.observe(self.store.clear(self.scope()).await)
    }

    fn scope(&self) -> StoreScope<'_> {
        StoreScope {
            namespace: &self.namespace,
            use_redis_sets: self.use_redis_sets.unwrap_or(false),
        }
    }

    fn observe<T>(&self, result: CacheResult<T>) -> CacheResult<T> {
        if let Err(error) = &result {
            for listener in &self.listeners {
                listener(error);
            }
        }
        result
    }
}
