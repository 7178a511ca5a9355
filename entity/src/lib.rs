//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod catalog_entities;

pub use catalog_entities::Entity as CatalogEntities;
