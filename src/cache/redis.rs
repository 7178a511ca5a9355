//! # Redis 存储
//!
//! 使用 `ConnectionManager` 自动重连。连接在第一次操作时建立，
//! 因此构造存储本身不会访问网络。

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use super::keys;
use crate::error::{CacheError, CacheResult};

/// 未配置连接时使用的默认地址
pub const DEFAULT_REDIS_URI: &str = "redis://127.0.0.1:6379";

/// Redis 存储实现
pub struct RedisStore {
    uri: String,
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("uri", &self.uri)
            .field("connected", &self.connection.initialized())
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// 使用连接 URI 创建存储，仅做格式校验
    pub fn new(uri: impl Into<String>) -> CacheResult<Self> {
        let uri = uri.into();
        let client = Client::open(uri.as_str())
            .map_err(|e| CacheError::invalid_connection("redis", uri.clone(), e.to_string()))?;

        Ok(Self {
            uri,
            client,
            connection: OnceCell::new(),
        })
    }

    /// 创建时使用的连接 URI
    #[must_use]
    pub fn connection_uri(&self) -> &str {
        &self.uri
    }

    async fn connection(&self) -> CacheResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!(uri = %self.uri, "正在连接 Redis");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;
        Ok(manager.clone())
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        ttl: Option<Duration>,
        use_sets: bool,
    ) -> CacheResult<()> {
        let mut conn = self.connection().await?;

        match ttl {
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex::<_, _, ()>(key, value, millis).await?;
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }

        if use_sets {
            conn.sadd::<_, _, ()>(keys::redis_namespace_set(namespace), key)
                .await?;
        }
        Ok(())
    }

    pub async fn delete(&self, namespace: &str, key: &str, use_sets: bool) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.del(key).await?;

        if use_sets {
            conn.srem::<_, _, ()>(keys::redis_namespace_set(namespace), key)
                .await?;
        }
        Ok(removed > 0)
    }

    /// 清空命名空间
    ///
    /// 启用 set 时从 `namespace:{ns}` 读取成员；否则按 `{ns}:*` 模式匹配。
    /// 成员与 set 键在同一个 MULTI 事务中删除，失败时 set 仍然记录着全部成员。
    pub async fn clear(&self, namespace: &str, use_sets: bool) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let set_key = keys::redis_namespace_set(namespace);

        let members: Vec<String> = if use_sets {
            conn.smembers(&set_key).await?
        } else {
            conn.keys(keys::redis_namespace_pattern(namespace)).await?
        };

        if members.is_empty() && !use_sets {
            debug!(namespace, "Redis 命名空间为空");
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        if !members.is_empty() {
            pipe.del(&members).ignore();
        }
        if use_sets {
            pipe.del(&set_key).ignore();
        }
        let (): () = pipe.query_async(&mut conn).await?;

        debug!(namespace, removed = members.len(), "Redis 命名空间已清空");
        Ok(())
    }
}
