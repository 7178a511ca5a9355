//! # 目录 HTTP 路由

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::model::CatalogEntity;
use super::repository::CatalogRepository;
use crate::cache::CacheClient;
use crate::error::{BackendError, Result};
use crate::service::permission::ServerPermissionClient;

/// 删除实体所需权限
pub const ENTITY_DELETE_PERMISSION: &str = "catalog.entity.delete";

/// 路由共享状态
#[derive(Clone)]
pub struct CatalogState {
    pub repository: CatalogRepository,
    pub cache: CacheClient,
    pub permissions: Arc<ServerPermissionClient>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    kind: Option<String>,
}

/// 创建目录路由
pub fn create_routes(state: CatalogState) -> Router {
    Router::new()
        .route("/entities", get(list_entities).post(upsert_entity))
        .route(
            "/entities/by-uid/{uid}",
            get(get_entity_by_uid).delete(delete_entity_by_uid),
        )
        .route(
            "/entities/by-name/{kind}/{namespace}/{name}",
            get(get_entity_by_name),
        )
        .route("/refresh", post(refresh))
        .with_state(state)
}

async fn list_entities(
    State(state): State<CatalogState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CatalogEntity>>> {
    let entities = state.repository.list(query.kind.as_deref()).await?;
    Ok(Json(entities))
}

async fn get_entity_by_uid(
    State(state): State<CatalogState>,
    Path(uid): Path<String>,
) -> Result<Json<CatalogEntity>> {
    state
        .repository
        .find_by_uid(&uid)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("entity", uid))
}

async fn get_entity_by_name(
    State(state): State<CatalogState>,
    Path((kind, namespace, name)): Path<(String, String, String)>,
) -> Result<Json<CatalogEntity>> {
    let entity_ref = entity::catalog_entities::entity_ref(&kind, &namespace, &name);

    // 缓存不可用时退回数据库；错误已由客户端监听器记录
    if let Ok(Some(entity)) = state.cache.get::<CatalogEntity>(&entity_ref).await {
        return Ok(Json(entity));
    }

    let entity = state
        .repository
        .find_by_ref(&entity_ref)
        .await?
        .ok_or_else(|| BackendError::not_found("entity", entity_ref.clone()))?;

    if let Err(e) = state.cache.set(&entity_ref, &entity, None).await {
        warn!(entity_ref, error = %e, "写入实体缓存失败");
    }
    Ok(Json(entity))
}

async fn upsert_entity(
    State(state): State<CatalogState>,
    Json(entity): Json<CatalogEntity>,
) -> Result<(StatusCode, Json<CatalogEntity>)> {
    let stored = state.repository.upsert(entity).await?;
    invalidate(&state.cache, &stored.entity_ref()).await;

    info!(entity_ref = %stored.entity_ref(), "实体已写入目录");
    Ok((StatusCode::OK, Json(stored)))
}

async fn delete_entity_by_uid(
    State(state): State<CatalogState>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    state
        .permissions
        .require(ENTITY_DELETE_PERMISSION, bearer_token(&headers))
        .await?;

    let entity_ref = state
        .repository
        .delete_by_uid(&uid)
        .await?
        .ok_or_else(|| BackendError::not_found("entity", uid.clone()))?;
    invalidate(&state.cache, &entity_ref).await;

    info!(uid, entity_ref, "实体已删除");
    Ok(StatusCode::NO_CONTENT)
}

/// 清空目录缓存
async fn refresh(State(state): State<CatalogState>) -> Result<StatusCode> {
    state.cache.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn invalidate(cache: &CacheClient, entity_ref: &str) {
    if let Err(e) = cache.delete(entity_ref).await {
        warn!(entity_ref, error = %e, "清除实体缓存失败");
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
