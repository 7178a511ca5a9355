//! # 缓存管理器
//!
//! 从配置中读取 `backend.cache`，构造唯一的存储实例，
//! 并为每个插件发放带命名空间的缓存客户端。

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::client::{CacheClient, ErrorHandler};
use super::store::{CacheStore, CacheStoreKind};
use crate::config::{AppConfig, CacheConfig};
use crate::error::{CacheError, CacheResult};

/// 未提供错误回调时写入日志的消息
pub const CLIENT_ERROR_MESSAGE: &str = "Failed to create cache client";

/// 缓存错误日志接口
pub trait CacheLogger: Send + Sync {
    fn error(&self, message: &str, error: &CacheError);
}

/// 默认日志实现，写入 tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCacheLogger;

impl CacheLogger for TracingCacheLogger {
    fn error(&self, message: &str, error: &CacheError) {
        error!(target: "cache_manager", error = %error, "{message}");
    }
}

/// 管理器构造选项
#[derive(Clone, Default)]
pub struct CacheManagerOptions {
    /// 错误日志接口，缺省为 [`TracingCacheLogger`]
    pub logger: Option<Arc<dyn CacheLogger>>,
    /// 错误回调；提供时不再写日志
    pub on_error: Option<ErrorHandler>,
}

impl CacheManagerOptions {
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn CacheLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.on_error = Some(handler);
        self
    }
}

/// 客户端选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// 默认 TTL
    pub default_ttl: Option<Duration>,
}

impl ClientOptions {
    #[must_use]
    pub const fn with_default_ttl(ttl: Duration) -> Self {
        Self {
            default_ttl: Some(ttl),
        }
    }

    /// 以毫秒指定默认 TTL
    #[must_use]
    pub const fn with_default_ttl_ms(millis: u64) -> Self {
        Self::with_default_ttl(Duration::from_millis(millis))
    }
}

/// 缓存管理器
pub struct CacheManager {
    store: Arc<CacheStore>,
    use_redis_sets: Option<bool>,
    error_handler: ErrorHandler,
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("store", &self.store)
            .field("use_redis_sets", &self.use_redis_sets)
            .finish_non_exhaustive()
    }
}

impl CacheManager {
    /// 从应用配置创建管理器
    ///
    /// 未知的存储类型或格式错误的连接串会立即返回错误，不会延迟到首次使用。
    pub fn from_config(config: &AppConfig, options: CacheManagerOptions) -> CacheResult<Self> {
        Self::from_cache_config(config.backend.cache.as_ref(), options)
    }

    pub fn from_cache_config(
        config: Option<&CacheConfig>,
        options: CacheManagerOptions,
    ) -> CacheResult<Self> {
        let store = CacheStore::from_config(config)?;
        let use_redis_sets = (store.kind() == CacheStoreKind::Redis)
            .then(|| config.and_then(|c| c.use_redis_sets).unwrap_or(true));

        info!(
            store = %store.kind(),
            use_redis_sets = ?use_redis_sets,
            "缓存管理器初始化完成"
        );

        Ok(Self {
            store: Arc::new(store),
            use_redis_sets,
            error_handler: Self::resolve_error_handler(options),
        })
    }

    fn resolve_error_handler(options: CacheManagerOptions) -> ErrorHandler {
        if let Some(handler) = options.on_error {
            return handler;
        }

        let logger = options
            .logger
            .unwrap_or_else(|| Arc::new(TracingCacheLogger));
        Arc::new(move |error: &CacheError| logger.error(CLIENT_ERROR_MESSAGE, error))
    }

    /// 获取插件作用域的缓存连接
    #[must_use]
    pub fn for_plugin(&self, plugin_id: impl Into<String>) -> PluginCacheConnection {
        PluginCacheConnection {
            plugin_id: plugin_id.into(),
            store: Arc::clone(&self.store),
            use_redis_sets: self.use_redis_sets,
            error_handler: Arc::clone(&self.error_handler),
        }
    }

    /// 共享的存储实例
    #[must_use]
    pub const fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }
}

/// 插件作用域的缓存连接
#[derive(Clone)]
pub struct PluginCacheConnection {
    plugin_id: String,
    store: Arc<CacheStore>,
    use_redis_sets: Option<bool>,
    error_handler: ErrorHandler,
}

impl std::fmt::Debug for PluginCacheConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCacheConnection")
            .field("plugin_id", &self.plugin_id)
            .field("store", &self.store.kind())
            .finish_non_exhaustive()
    }
}

impl PluginCacheConnection {
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// 创建缓存客户端
    ///
    /// 每次调用都会返回新的客户端，并注册一个错误监听器。
    #[must_use]
    pub fn get_client(&self, options: ClientOptions) -> CacheClient {
        debug!(
            plugin_id = %self.plugin_id,
            store = %self.store.kind(),
            default_ttl = ?options.default_ttl,
            "创建缓存客户端"
        );

        let mut client = CacheClient::new(
            Arc::clone(&self.store),
            self.plugin_id.clone(),
            options.default_ttl,
            self.use_redis_sets,
        );
        client.on_error(Arc::clone(&self.error_handler));
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Mutex;

    fn config_with(cache: Option<CacheConfig>) -> AppConfig {
        let mut config = AppConfig::default();
        config.backend.cache = cache;
        config
    }

    fn cache(store: &str, connection: Option<&str>) -> CacheConfig {
        CacheConfig {
            store: Some(store.to_string()),
            connection: connection.map(str::to_string),
            use_redis_sets: None,
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        entries: Mutex<Vec<(String, String)>>,
    }

    impl CacheLogger for RecordingLogger {
        fn error(&self, message: &str, error: &CacheError) {
            self.entries
                .lock()
                .unwrap()
                .push((message.to_string(), error.to_string()));
        }
    }

    #[rstest]
    #[case("memory")]
    #[case("memcache")]
    #[case("redis")]
    fn test_accepts_known_stores(#[case] store: &str) {
        let config = config_with(Some(cache(store, None)));
        let manager = CacheManager::from_config(&config, CacheManagerOptions::default()).unwrap();
        assert_eq!(manager.store().kind().as_str(), store);
    }

    #[test]
    fn test_rejects_unknown_store() {
        let config = config_with(Some(cache("notreal", None)));
        let err = CacheManager::from_config(&config, CacheManagerOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "未知的缓存存储: notreal");
    }

    #[test]
    fn test_missing_cache_section_uses_memory() {
        let manager =
            CacheManager::from_config(&config_with(None), CacheManagerOptions::default()).unwrap();
        assert_eq!(manager.store().kind(), CacheStoreKind::Memory);
    }

    #[test]
    fn test_namespace_and_ttl_are_passed_through() {
        let manager =
            CacheManager::from_config(&config_with(None), CacheManagerOptions::default()).unwrap();
        let client = manager
            .for_plugin("test1")
            .get_client(ClientOptions::with_default_ttl_ms(10));

        assert_eq!(client.namespace(), "test1");
        assert_eq!(client.default_ttl(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_memory_store_is_shared_between_plugins() {
        let manager =
            CacheManager::from_config(&config_with(None), CacheManagerOptions::default()).unwrap();
        let a = manager.for_plugin("a").get_client(ClientOptions::default());
        let b = manager.for_plugin("b").get_client(ClientOptions::default());

        assert!(Arc::ptr_eq(a.store(), b.store()));
        assert!(Arc::ptr_eq(a.store(), manager.store()));
        assert_eq!(a.use_redis_sets(), None);
    }

    #[test]
    fn test_memcache_address_is_used() {
        let config = config_with(Some(cache("memcache", Some("alpha:11211"))));
        let manager = CacheManager::from_config(&config, CacheManagerOptions::default()).unwrap();
        let client = manager.for_plugin("p").get_client(ClientOptions::default());

        let memcache = client.store().as_memcache().unwrap();
        assert_eq!(memcache.address(), "alpha:11211");
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(true), true)]
    #[case(Some(false), false)]
    fn test_redis_uri_and_sets_flag(#[case] flag: Option<bool>, #[case] expected: bool) {
        let mut redis = cache("redis", Some("redis://127.0.0.1:6379/2"));
        redis.use_redis_sets = flag;
        let manager =
            CacheManager::from_config(&config_with(Some(redis)), CacheManagerOptions::default())
                .unwrap();
        let client = manager.for_plugin("p").get_client(ClientOptions::default());

        let store = client.store().as_redis().unwrap();
        assert_eq!(store.connection_uri(), "redis://127.0.0.1:6379/2");
        assert_eq!(client.use_redis_sets(), Some(expected));
    }

    #[test]
    fn test_malformed_connection_fails_at_construction() {
        let config = config_with(Some(cache("memcache", Some("no-port-here"))));
        let err = CacheManager::from_config(&config, CacheManagerOptions::default()).unwrap_err();
        assert!(err.is_configuration_error());
    }

    /// memcache 在连接前校验键，含空格的键可以稳定触发存储错误
    fn memcache_config() -> AppConfig {
        config_with(Some(cache("memcache", Some("127.0.0.1:11211"))))
    }

    #[tokio::test]
    async fn test_custom_error_handler_is_attached() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let logger = Arc::new(RecordingLogger::default());
        let options = CacheManagerOptions::default()
            .with_logger(logger.clone())
            .with_error_handler(Arc::new(move |err: &CacheError| {
                sink.lock().unwrap().push(err.to_string());
            }));

        let manager = CacheManager::from_config(&memcache_config(), options).unwrap();
        let client = manager.for_plugin("p").get_client(ClientOptions::default());
        assert_eq!(client.error_listener_count(), 1);

        assert!(client.delete("bad key").await.is_err());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("bad key"));
        assert!(logger.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logger_is_used_without_error_handler() {
        let logger = Arc::new(RecordingLogger::default());
        let options = CacheManagerOptions::default().with_logger(logger.clone());

        let manager = CacheManager::from_config(&memcache_config(), options).unwrap();
        let client = manager.for_plugin("p").get_client(ClientOptions::default());
        assert_eq!(client.error_listener_count(), 1);

        assert!(client.get::<String>("bad key").await.is_err());

        let entries = logger.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, CLIENT_ERROR_MESSAGE);
        assert!(entries[0].1.contains("bad key"));
    }

    #[tokio::test]
    async fn test_plugin_ids_sharing_a_prefix_do_not_collide() {
        let manager =
            CacheManager::from_config(&config_with(None), CacheManagerOptions::default()).unwrap();
        let a = manager.for_plugin("a").get_client(ClientOptions::default());
        let ab = manager.for_plugin("a:b").get_client(ClientOptions::default());

        ab.set("c", "from plugin a:b", None).await.unwrap();
        assert_eq!(a.get::<String>("b:c").await.unwrap(), None);

        a.clear().await.unwrap();
        assert_eq!(
            ab.get::<String>("c").await.unwrap().as_deref(),
            Some("from plugin a:b")
        );
    }

    #[test]
    fn test_each_client_gets_its_own_listener() {
        let manager =
            CacheManager::from_config(&config_with(None), CacheManagerOptions::default()).unwrap();
        let plugin = manager.for_plugin("p");

        let first = plugin.get_client(ClientOptions::default());
        let second = plugin.get_client(ClientOptions::default());
        assert_eq!(first.error_listener_count(), 1);
        assert_eq!(second.error_listener_count(), 1);
    }
}
