//! API Key 值对象
//!
//! 只存在于内存中，Debug 输出做脱敏处理

use thiserror::Error;

/// 最短长度
const MIN_KEY_LEN: usize = 20;

/// Google API Key 的常见前缀
const GOOGLE_KEY_PREFIX: &str = "AIza";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("API Key 不能为空")]
    Empty,

    #[error("API Key 过短 (至少 20 个字符)")]
    TooShort,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// 校验并创建 API Key
    ///
    /// 非 `AIza` 开头的 key 仍被接受，只记录告警
    pub fn new(key: impl Into<String>) -> Result<Self, CredentialError> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(CredentialError::Empty);
        }
        if key.len() < MIN_KEY_LEN {
            return Err(CredentialError::TooShort);
        }
        if !key.starts_with(GOOGLE_KEY_PREFIX) {
            tracing::warn!("API key does not look like a standard Google API key");
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(****)")
    }
}
