//! # 缓存模块
//!
//! 插件作用域的缓存：一个 [`CacheManager`] 持有唯一的存储（内存 / memcache / Redis），
//! 每个插件通过 [`PluginCacheConnection::get_client`] 获取带命名空间的 [`CacheClient`]。

pub mod client;
pub mod keys;
pub mod manager;
pub mod memcache;
pub mod memory;
pub mod redis;
pub mod store;

pub use client::{CacheClient, ErrorHandler};
pub use manager::{
    CLIENT_ERROR_MESSAGE, CacheLogger, CacheManager, CacheManagerOptions, ClientOptions,
    PluginCacheConnection, TracingCacheLogger,
};
pub use memcache::MemcacheStore;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use store::{CacheStore, CacheStoreKind};
