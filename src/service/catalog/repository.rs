//! # 目录实体存储
//!
//! 基于 Sea-ORM 的 `catalog_entities` 表读写

use chrono::Utc;
use entity::catalog_entities::{self, Column, Entity as CatalogEntities};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use super::model::CatalogEntity;
use crate::error::{BackendError, Result};

/// 目录实体存储
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    db: DatabaseConnection,
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 列出实体，可按类型过滤（不区分大小写）
    pub async fn list(&self, kind: Option<&str>) -> Result<Vec<CatalogEntity>> {
        let mut query = CatalogEntities::find().order_by_asc(Column::EntityRef);
        if let Some(kind) = kind {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(Column::Kind))).eq(kind.to_lowercase()),
            );
        }

        query
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_entity)
            .collect()
    }

    pub async fn find_by_uid(&self, uid: &str) -> Result<Option<CatalogEntity>> {
        CatalogEntities::find_by_id(uid.to_string())
            .one(&self.db)
            .await?
            .map(to_entity)
            .transpose()
    }

    pub async fn find_by_ref(&self, entity_ref: &str) -> Result<Option<CatalogEntity>> {
        CatalogEntities::find()
            .filter(Column::EntityRef.eq(entity_ref))
            .one(&self.db)
            .await?
            .map(to_entity)
            .transpose()
    }

    /// 按引用插入或更新，已存在的实体保留原 uid
    pub async fn upsert(&self, mut entity: CatalogEntity) -> Result<CatalogEntity> {
        entity.validate()?;
        let entity_ref = entity.entity_ref();
        let now = Utc::now().naive_utc();

        let existing = CatalogEntities::find()
            .filter(Column::EntityRef.eq(entity_ref.as_str()))
            .one(&self.db)
            .await?;

        match existing {
            Some(row) => {
                entity.metadata.uid = Some(row.uid.clone());
                let mut active: catalog_entities::ActiveModel = row.into();
                active.kind = Set(entity.kind.clone());
                active.namespace = Set(entity.metadata.namespace.clone());
                active.name = Set(entity.metadata.name.clone());
                active.body = Set(serde_json::to_value(&entity)?);
                active.updated_at = Set(now);
                active.update(&self.db).await?;
                debug!(entity_ref, "实体已更新");
            }
            None => {
                let uid = uuid::Uuid::new_v4().to_string();
                entity.metadata.uid = Some(uid.clone());
                let active = catalog_entities::ActiveModel {
                    uid: Set(uid),
                    entity_ref: Set(entity_ref.clone()),
                    kind: Set(entity.kind.clone()),
                    namespace: Set(entity.metadata.namespace.clone()),
                    name: Set(entity.metadata.name.clone()),
                    body: Set(serde_json::to_value(&entity)?),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active.insert(&self.db).await?;
                debug!(entity_ref, "实体已创建");
            }
        }

        Ok(entity)
    }

    /// 删除实体，返回被删除实体的引用
    pub async fn delete_by_uid(&self, uid: &str) -> Result<Option<String>> {
        let Some(row) = CatalogEntities::find_by_id(uid.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        CatalogEntities::delete_by_id(uid.to_string())
            .exec(&self.db)
            .await?;
        Ok(Some(row.entity_ref))
    }
}

fn to_entity(row: catalog_entities::Model) -> Result<CatalogEntity> {
    serde_json::from_value(row.body).map_err(|e| {
        BackendError::database_with_source(format!("实体数据损坏: {}", row.uid), e)
    })
}
