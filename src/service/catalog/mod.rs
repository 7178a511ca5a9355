//! # 目录插件
//!
//! 软件目录的最小实现：实体的增删查，按名称查询走插件缓存。

mod builder;
mod model;
mod repository;
mod router;

pub use builder::{CatalogBuilder, CatalogPlugin, DEFAULT_ENTITY_CACHE_TTL, PluginEnvironment};
pub use model::{CatalogEntity, DEFAULT_NAMESPACE, EntityMetadata};
pub use repository::CatalogRepository;
pub use router::{CatalogState, ENTITY_DELETE_PERMISSION, create_routes};

/// 目录插件 ID
pub const CATALOG_PLUGIN_ID: &str = "catalog";
