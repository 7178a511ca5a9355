//! # 目录实体模型
//!
//! HTTP 层使用的实体描述：`apiVersion` / `kind` / `metadata` / `spec`。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BackendError, Result};

/// 缺省命名空间
pub const DEFAULT_NAMESPACE: &str = "default";

const MAX_NAME_LENGTH: usize = 63;

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// 目录实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntity {
    pub api_version: String,
    pub kind: String,
    pub metadata: EntityMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
}

/// 实体元数据，未识别的字段原样保留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntity {
    /// 规范化引用 `kind:namespace/name`
    #[must_use]
    pub fn entity_ref(&self) -> String {
        entity::catalog_entities::entity_ref(&self.kind, &self.metadata.namespace, &self.metadata.name)
    }

    /// 校验必填字段和命名规则
    pub fn validate(&self) -> Result<()> {
        if self.api_version.trim().is_empty() {
            return Err(BackendError::validation("apiVersion 不能为空"));
        }
        if self.kind.trim().is_empty() {
            return Err(BackendError::validation("kind 不能为空"));
        }
        validate_name("metadata.name", &self.metadata.name)?;
        validate_name("metadata.namespace", &self.metadata.namespace)?;
        Ok(())
    }
}

/// 名称规则：1-63 个字符，字母数字开头和结尾，中间允许 `-` `_` `.`
fn validate_name(field: &str, value: &str) -> Result<()> {
    let valid_length = !value.is_empty() && value.len() <= MAX_NAME_LENGTH;
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    let valid_edges = value.starts_with(|c: char| c.is_ascii_alphanumeric())
        && value.ends_with(|c: char| c.is_ascii_alphanumeric());

    if valid_length && valid_chars && valid_edges {
        Ok(())
    } else {
        Err(BackendError::validation(format!("{field} 不合法: {value:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> CatalogEntity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_namespace_defaults_and_extra_fields_survive() {
        let entity = parse(json!({
            "apiVersion": "backstage.io/v1alpha1",
            "kind": "Component",
            "metadata": { "name": "web", "labels": { "tier": "frontend" } },
            "spec": { "type": "website" }
        }));

        assert_eq!(entity.metadata.namespace, DEFAULT_NAMESPACE);
        assert_eq!(entity.entity_ref(), "component:default/web");
        let round_trip = serde_json::to_value(&entity).unwrap();
        assert_eq!(round_trip["metadata"]["labels"]["tier"], "frontend");
        assert!(entity.validate().is_ok());
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        for name in ["", "-web", "web-", "has space", &"a".repeat(64)] {
            let entity = parse(json!({
                "apiVersion": "v1",
                "kind": "Component",
                "metadata": { "name": name }
            }));
            assert!(entity.validate().is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let entity = parse(json!({
            "apiVersion": "v1",
            "kind": " ",
            "metadata": { "name": "web" }
        }));
        assert!(entity.validate().is_err());
    }
}
