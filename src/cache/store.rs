//! # 缓存存储
//!
//! 根据 `backend.cache.store` 选择具体驱动，使用枚举分发而非 trait object。

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::memcache::{DEFAULT_MEMCACHE_ADDRESS, MemcacheStore};
use super::memory::MemoryStore;
use super::redis::{DEFAULT_REDIS_URI, RedisStore};
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};

/// 支持的存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheStoreKind {
    #[default]
    Memory,
    Memcache,
    Redis,
}

impl CacheStoreKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Memcache => "memcache",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for CacheStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheStoreKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "memcache" => Ok(Self::Memcache),
            "redis" => Ok(Self::Redis),
            other => Err(CacheError::unknown_store(other)),
        }
    }
}

/// 存储驱动
///
/// 一个 `CacheManager` 只持有一个存储实例，所有插件客户端共享。
#[derive(Debug)]
pub enum CacheStore {
    Memory(MemoryStore),
    Memcache(MemcacheStore),
    Redis(RedisStore),
}

impl CacheStore {
    /// 按配置构造存储；缺省为内存存储
    pub fn from_config(config: Option<&CacheConfig>) -> CacheResult<Self> {
        let kind = config
            .and_then(|c| c.store.as_deref())
            .map(str::parse::<CacheStoreKind>)
            .transpose()?
            .unwrap_or_default();
        let connection = config.and_then(|c| c.connection.as_deref());

        Self::build(kind, connection)
    }

    pub fn build(kind: CacheStoreKind, connection: Option<&str>) -> CacheResult<Self> {
        let store = match kind {
            CacheStoreKind::Memory => Self::Memory(MemoryStore::new()),
            CacheStoreKind::Memcache => Self::Memcache(MemcacheStore::new(
                connection.unwrap_or(DEFAULT_MEMCACHE_ADDRESS),
            )?),
            CacheStoreKind::Redis => {
                Self::Redis(RedisStore::new(connection.unwrap_or(DEFAULT_REDIS_URI))?)
            }
        };
        Ok(store)
    }

    #[must_use]
    pub const fn kind(&self) -> CacheStoreKind {
        match self {
            Self::Memory(_) => CacheStoreKind::Memory,
            Self::Memcache(_) => CacheStoreKind::Memcache,
            Self::Redis(_) => CacheStoreKind::Redis,
        }
    }

    #[must_use]
    pub const fn as_memory(&self) -> Option<&MemoryStore> {
        match self {
            Self::Memory(store) => Some(store),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_memcache(&self) -> Option<&MemcacheStore> {
        match self {
            Self::Memcache(store) => Some(store),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_redis(&self) -> Option<&RedisStore> {
        match self {
            Self::Redis(store) => Some(store),
            _ => None,
        }
    }

    pub(crate) async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            Self::Memory(store) => Ok(store.get(key)),
            Self::Memcache(store) => store.get(key).await,
            Self::Redis(store) => store.get(key).await,
        }
    }

    pub(crate) async fn set(
        &self,
        scope: StoreScope<'_>,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        match self {
            Self::Memory(store) => {
                store.set(key, value, ttl);
                Ok(())
            }
            Self::Memcache(store) => store.set(key, value, ttl).await,
            Self::Redis(store) => {
                store
                    .set(scope.namespace, key, value, ttl, scope.use_redis_sets)
                    .await
            }
        }
    }

    pub(crate) async fn delete(&self, scope: StoreScope<'_>, key: &str) -> CacheResult<bool> {
        match self {
            Self::Memory(store) => Ok(store.delete(key)),
            Self::Memcache(store) => store.delete(key).await,
            Self::Redis(store) => {
                store
                    .delete(scope.namespace, key, scope.use_redis_sets)
                    .await
            }
        }
    }

    pub(crate) async fn clear(&self, scope: StoreScope<'_>) -> CacheResult<()> {
        match self {
            Self::Memory(store) => {
                store.clear_namespace(scope.namespace);
                Ok(())
            }
            Self::Memcache(store) => store.clear(scope.namespace).await,
            Self::Redis(store) => store.clear(scope.namespace, scope.use_redis_sets).await,
        }
    }
}

/// 单次操作所属的命名空间信息
#[derive(Debug, Clone, Copy)]
pub(crate) struct StoreScope<'a> {
    pub namespace: &'a str,
    pub use_redis_sets: bool,
}
