//! # Memcache 存储
//!
//! `memcache` crate 是同步客户端，所有调用都放到 `spawn_blocking` 中执行。

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::keys;
use crate::error::{CacheError, CacheResult};

/// 未配置连接时使用的默认地址
pub const DEFAULT_MEMCACHE_ADDRESS: &str = "127.0.0.1:11211";

/// 超过该秒数的过期时间会被 memcached 当作 Unix 时间戳
const RELATIVE_EXPIRATION_LIMIT: u64 = 30 * 24 * 60 * 60;

/// Memcache 存储实现
pub struct MemcacheStore {
    address: String,
    client: OnceCell<Arc<memcache::Client>>,
}

impl std::fmt::Debug for MemcacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcacheStore")
            .field("address", &self.address)
            .field("connected", &self.client.initialized())
            .finish_non_exhaustive()
    }
}

impl MemcacheStore {
    /// 使用 `host:port` 地址创建存储，仅做格式校验
    pub fn new(address: impl Into<String>) -> CacheResult<Self> {
        let address = address.into();
        parse_address(&address)?;

        Ok(Self {
            address,
            client: OnceCell::new(),
        })
    }

    /// 创建时使用的服务器地址
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn client(&self) -> CacheResult<Arc<memcache::Client>> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let url = format!("memcache://{}", self.address);
                debug!(address = %self.address, "正在连接 memcached");
                run_blocking(move || memcache::Client::connect(url).map_err(CacheError::from))
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(client))
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        keys::validate_key(key)?;
        let client = self.client().await?;
        let key = key.to_string();
        run_blocking(move || client.get::<String>(&key).map_err(CacheError::from)).await
    }

    pub async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        keys::validate_key(key)?;
        let client = self.client().await?;
        let key = key.to_string();
        let expiration = expiration_for(ttl);
        run_blocking(move || {
            client
                .set(&key, value.as_str(), expiration)
                .map_err(CacheError::from)
        })
        .await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        keys::validate_key(key)?;
        let client = self.client().await?;
        let key = key.to_string();
        run_blocking(move || client.delete(&key).map_err(CacheError::from)).await
    }

    /// memcached 不支持按前缀删除，只能整体清空
    pub async fn clear(&self, namespace: &str) -> CacheResult<()> {
        warn!(
            namespace,
            address = %self.address,
            "memcached 不支持按命名空间清空，将清空整个服务器"
        );
        let client = self.client().await?;
        run_blocking(move || client.flush().map_err(CacheError::from)).await
    }
}

fn parse_address(address: &str) -> CacheResult<()> {
    let invalid = |reason: &str| CacheError::invalid_connection("memcache", address, reason);

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| invalid("应为 host:port 格式"))?;

    if host.is_empty() {
        return Err(invalid("主机名为空"));
    }
    port.parse::<u16>().map_err(|_| invalid("端口不是有效数字"))?;
    Ok(())
}

/// 将 TTL 换算为 memcached 的过期参数（秒，向上取整；0 表示不过期）
fn expiration_for(ttl: Option<Duration>) -> u32 {
    let Some(ttl) = ttl else {
        return 0;
    };

    let mut secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || secs == 0 {
        secs += 1;
    }

    if secs > RELATIVE_EXPIRATION_LIMIT {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        secs = now.saturating_add(secs);
    }

    u32::try_from(secs).unwrap_or(u32::MAX)
}

async fn run_blocking<T, F>(f: F) -> CacheResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> CacheResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CacheError::operation(format!("memcache 任务执行失败: {e}")))?
}
