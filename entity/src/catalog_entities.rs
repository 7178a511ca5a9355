//! # 目录实体定义
//!
//! 软件目录中实体（Component、API、System 等）的 Sea-ORM 实体模型

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 目录实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "catalog_entities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,
    /// 规范化引用 `kind:namespace/name`（小写），唯一
    #[sea_orm(unique)]
    pub entity_ref: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    /// 完整的实体描述 JSON
    pub body: Json,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// 生成规范化实体引用
#[must_use]
pub fn entity_ref(kind: &str, namespace: &str, name: &str) -> String {
    format!(
        "{}:{}/{}",
        kind.to_lowercase(),
        namespace.to_lowercase(),
        name.to_lowercase()
    )
}
