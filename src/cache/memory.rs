//! # 内存存储
//!
//! 进程内的键值存储。同一个 `CacheManager` 下的所有客户端共享这一个实例。

use dashmap::DashMap;
use std::time::{Duration, Instant};

use super::keys;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    /// 超出 `Instant` 表示范围的 TTL 视为永不过期
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

/// 内存存储实现
///
/// 过期项在读取时惰性清理，也可以调用 [`MemoryStore::purge_expired`] 主动清理。
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取原始值
    pub fn get(&self, key: &str) -> Option<String> {
        // 先取出结果再释放分片锁，避免在持有引用时删除
        let lookup = self
            .data
            .get(key)
            .map(|entry| (entry.is_expired(), entry.value.clone()));

        match lookup {
            Some((false, value)) => Some(value),
            Some((true, _)) => {
                self.data.remove_if(key, |_, entry| entry.is_expired());
                None
            }
            None => None,
        }
    }

    /// 写入原始值
    pub fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        self.data.insert(key.to_string(), CacheEntry::new(value, ttl));
    }

    /// 删除键，返回键是否存在且未过期
    pub fn delete(&self, key: &str) -> bool {
        self.data
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired())
    }

    /// 清空某个命名空间下的全部键
    pub fn clear_namespace(&self, namespace: &str) {
        let prefix = keys::namespace_prefix(namespace);
        self.data.retain(|key, _| !key.starts_with(&prefix));
    }

    /// 移除所有已过期的键，返回移除数量
    pub fn purge_expired(&self) -> usize {
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.data.len())
    }

    /// 当前条目数（包含尚未清理的过期项）
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
