//! # Backend Common
//!
//! 插件作用域的缓存管理器，以及以独立模式运行目录插件所需的后端组件

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod service;

// Re-export commonly used types
pub use cache::{CacheClient, CacheManager, CacheManagerOptions, ClientOptions};
pub use config::AppConfig;
pub use error::{BackendError, CacheError, Result};
