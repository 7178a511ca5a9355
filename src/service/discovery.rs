//! # 插件地址发现
//!
//! 内部地址由监听配置推导，外部地址由 `backend.baseUrl` 推导，
//! 两者都以 `/api/{pluginId}` 结尾。

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::{BackendError, Result};

/// 插件地址发现接口
#[async_trait]
pub trait PluginEndpointDiscovery: Send + Sync {
    /// 服务间调用使用的地址
    async fn get_base_url(&self, plugin_id: &str) -> Result<String>;

    /// 浏览器等外部调用方使用的地址
    async fn get_external_base_url(&self, plugin_id: &str) -> Result<String>;
}

/// 基于配置的地址发现
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDiscovery {
    internal_base_url: String,
    external_base_url: String,
}

impl HostDiscovery {
    pub fn new(internal_base_url: impl Into<String>, external_base_url: impl Into<String>) -> Self {
        Self {
            internal_base_url: trim_trailing_slash(internal_base_url.into()),
            external_base_url: trim_trailing_slash(external_base_url.into()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let backend = &config.backend;
        let external = url::Url::parse(&backend.base_url).map_err(|e| {
            BackendError::config_with_source(
                format!("backend.baseUrl 不是合法的 URL: {}", backend.base_url),
                e,
            )
        })?;

        // 监听所有地址时，服务间调用走本机回环
        let host = match backend.listen.host.as_str() {
            "" | "0.0.0.0" | "::" => "localhost",
            host => host,
        };
        let internal = format!("{}://{host}:{}", external.scheme(), backend.listen.port);

        Ok(Self::new(internal, backend.base_url.clone()))
    }

    #[must_use]
    pub fn internal_url(&self, plugin_id: &str) -> String {
        format!("{}/api/{plugin_id}", self.internal_base_url)
    }

    #[must_use]
    pub fn external_url(&self, plugin_id: &str) -> String {
        format!("{}/api/{plugin_id}", self.external_base_url)
    }
}

#[async_trait]
impl PluginEndpointDiscovery for HostDiscovery {
    async fn get_base_url(&self, plugin_id: &str) -> Result<String> {
        Ok(self.internal_url(plugin_id))
    }

    async fn get_external_base_url(&self, plugin_id: &str) -> Result<String> {
        Ok(self.external_url(plugin_id))
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
