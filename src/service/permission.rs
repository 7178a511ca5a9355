//! # 权限客户端
//!
//! 权限框架关闭时一律放行。开启后，携带有效服务令牌的请求直接放行，
//! 其余请求交给权限后端 `{permission}/authorize` 判定。

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::discovery::PluginEndpointDiscovery;
use super::token::ServerTokenManager;
use crate::config::AppConfig;
use crate::error::{BackendError, Result};

/// 权限后端的插件 ID
pub const PERMISSION_PLUGIN_ID: &str = "permission";

/// 授权结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorizeResult {
    Allow,
    Deny,
}

impl AuthorizeResult {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Debug, Serialize)]
struct AuthorizeRequest<'a> {
    items: Vec<AuthorizeRequestItem<'a>>,
}

#[derive(Debug, Serialize)]
struct AuthorizeRequestItem<'a> {
    id: String,
    permission: PermissionRef<'a>,
}

#[derive(Debug, Serialize)]
struct PermissionRef<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    items: Vec<AuthorizeResponseItem>,
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponseItem {
    id: String,
    result: AuthorizeResult,
}

/// 服务端权限客户端
pub struct ServerPermissionClient {
    enabled: bool,
    discovery: Arc<dyn PluginEndpointDiscovery>,
    token_manager: Arc<ServerTokenManager>,
    http: reqwest::Client,
}

impl std::fmt::Debug for ServerPermissionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerPermissionClient")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl ServerPermissionClient {
    /// 从配置创建
    ///
    /// 开启权限框架时必须配置服务间认证，否则无法识别服务令牌。
    pub fn from_config(
        config: &AppConfig,
        discovery: Arc<dyn PluginEndpointDiscovery>,
        token_manager: Arc<ServerTokenManager>,
    ) -> Result<Self> {
        let enabled = config.permission.enabled;
        if enabled && token_manager.is_noop() {
            return Err(BackendError::config(
                "开启 permission.enabled 前必须配置服务间认证",
            ));
        }

        Ok(Self {
            enabled,
            discovery,
            token_manager,
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 判定一次权限请求
    pub async fn authorize(&self, permission: &str, token: Option<&str>) -> Result<AuthorizeResult> {
        if !self.enabled {
            return Ok(AuthorizeResult::Allow);
        }

        if let Some(token) = token {
            if self.token_manager.authenticate(token).is_ok() {
                debug!(permission, "服务令牌请求，直接放行");
                return Ok(AuthorizeResult::Allow);
            }
        }

        self.remote_authorize(permission, token).await
    }

    async fn remote_authorize(
        &self,
        permission: &str,
        token: Option<&str>,
    ) -> Result<AuthorizeResult> {
        let base_url = self.discovery.get_base_url(PERMISSION_PLUGIN_ID).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let body = AuthorizeRequest {
            items: vec![AuthorizeRequestItem {
                id: id.clone(),
                permission: PermissionRef { name: permission },
            }],
        };

        let mut request = self.http.post(format!("{base_url}/authorize")).json(&body);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| {
            BackendError::network_with_source("权限后端请求失败", e)
        })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), permission, "权限后端返回错误状态");
            return Err(BackendError::internal(format!(
                "权限后端返回错误状态: {}",
                response.status()
            )));
        }

        let decision: AuthorizeResponse = response.json().await.map_err(|e| {
            BackendError::network_with_source("权限后端响应解析失败", e)
        })?;

        decision
            .items
            .into_iter()
            .find(|item| item.id == id)
            .map(|item| item.result)
            .ok_or_else(|| BackendError::internal("权限后端响应缺少对应的判定结果"))
    }

    /// 判定失败时返回 `PermissionDenied`
    pub async fn require(&self, permission: &str, token: Option<&str>) -> Result<()> {
        if self.authorize(permission, token).await?.is_allowed() {
            Ok(())
        } else {
            Err(BackendError::permission_denied(permission))
        }
    }
}
