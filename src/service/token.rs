//! # 服务间令牌
//!
//! 使用 `backend.auth.keys` 中的共享密钥签发和校验 HS256 JWT。
//! 第一个密钥用于签发，所有密钥都可用于校验，便于密钥轮换。

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{BackendError, Result};

/// 服务令牌的 subject
pub const SERVER_TOKEN_SUBJECT: &str = "backstage-server";

/// 令牌有效期
const TOKEN_TTL_MINUTES: i64 = 60;

/// 服务令牌声明
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: Vec<DecodingKey>,
}

/// 服务令牌管理器
pub struct ServerTokenManager {
    keys: Option<SigningKeys>,
    validation: Validation,
}

impl std::fmt::Debug for ServerTokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerTokenManager")
            .field("noop", &self.is_noop())
            .field(
                "verification_keys",
                &self.keys.as_ref().map_or(0, |keys| keys.decoding.len()),
            )
            .finish()
    }
}

impl ServerTokenManager {
    /// 从配置创建；没有配置密钥时生成一个随机密钥
    pub fn from_config(config: &AppConfig) -> Self {
        let secrets: Vec<Vec<u8>> = config
            .backend
            .auth
            .keys
            .iter()
            .map(|key| key.secret.as_bytes().to_vec())
            .collect();

        if secrets.is_empty() {
            warn!("未配置 backend.auth.keys，使用随机生成的服务令牌密钥，其他实例将无法验证本实例签发的令牌");
            return Self::with_secrets(&[rand::random::<[u8; 32]>().to_vec()]);
        }

        Self::with_secrets(&secrets)
    }

    /// 使用给定密钥列表创建，列表不能为空
    #[must_use]
    pub fn with_secrets(secrets: &[Vec<u8>]) -> Self {
        let keys = secrets.first().map(|first| SigningKeys {
            encoding: EncodingKey::from_secret(first),
            decoding: secrets
                .iter()
                .map(|secret| DecodingKey::from_secret(secret))
                .collect(),
        });

        Self {
            keys,
            validation: Self::validation(),
        }
    }

    /// 不签发也不校验令牌的管理器
    #[must_use]
    pub fn noop() -> Self {
        Self {
            keys: None,
            validation: Self::validation(),
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.sub = Some(SERVER_TOKEN_SUBJECT.to_string());
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 30;
        validation
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.keys.is_none()
    }

    /// 签发服务令牌；noop 管理器返回空字符串
    pub fn get_token(&self) -> Result<String> {
        let Some(keys) = &self.keys else {
            return Ok(String::new());
        };

        let now = Utc::now();
        let claims = ServerTokenClaims {
            sub: SERVER_TOKEN_SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(|e| {
            BackendError::internal(format!("服务令牌签发失败: {e}"))
        })
    }

    /// 校验服务令牌；noop 管理器接受任何令牌
    pub fn authenticate(&self, token: &str) -> Result<()> {
        let Some(keys) = &self.keys else {
            return Ok(());
        };

        let mut last_error = None;
        for key in &keys.decoding {
            match decode::<ServerTokenClaims>(token, key, &self.validation) {
                Ok(_) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }

        debug!(error = ?last_error, "服务令牌校验失败");
        Err(match last_error {
            Some(e) => BackendError::authentication_with_source("服务令牌无效", e),
            None => BackendError::authentication("服务令牌无效"),
        })
    }
}
