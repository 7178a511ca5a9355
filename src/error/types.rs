//! # 错误类型定义

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use super::cache::CacheError;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum BackendError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 缓存相关错误
    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),

    /// 网络通信错误
    #[error("网络错误: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 服务令牌认证错误
    #[error("认证错误: {message}")]
    Authentication {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 权限拒绝
    #[error("权限不足: {permission}")]
    PermissionDenied { permission: String },

    /// 请求校验错误
    #[error("请求无效: {message}")]
    Validation { message: String },

    /// 资源未找到
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 服务器初始化错误
    #[error("服务器初始化错误: {message}")]
    ServerInit {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 服务器启动错误
    #[error("服务器启动错误: {message}")]
    ServerStart {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 附加上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<BackendError>,
    },
}

impl BackendError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR"),
            Self::Network { .. } => (StatusCode::BAD_GATEWAY, "NETWORK_ERROR"),
            Self::Authentication { .. } => (StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR"),
            Self::PermissionDenied { .. } => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::ServerInit { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_INIT_ERROR"),
            Self::ServerStart { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_START_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::Serialization { .. } => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的网络错误
    pub fn network_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建认证错误
    pub fn authentication<T: Into<String>>(message: T) -> Self {
        Self::Authentication {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的认证错误
    pub fn authentication_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Authentication {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建权限拒绝错误
    pub fn permission_denied<T: Into<String>>(permission: T) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    /// 创建请求校验错误
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建带来源的服务器初始化错误
    pub fn server_init_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerInit {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的服务器启动错误
    pub fn server_start_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerStart {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_http_response_parts();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "请求处理失败");
        }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for BackendError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for BackendError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

// Reqwest错误转换
impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_with_source("HTTP请求失败", err)
    }
}

// JWT错误转换
impl From<jsonwebtoken::errors::Error> for BackendError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::authentication_with_source("JWT处理失败", err)
    }
}
