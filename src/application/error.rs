//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{ModelError, PlaybackError};
use crate::domain::story::StoryError;
use crate::domain::CredentialError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found")]
    NotFound { resource_type: &'static str },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 未配置 API Key
    #[error("API key is not configured")]
    MissingCredentials,

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 播放错误
    #[error("Playback error: {0}")]
    PlaybackError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str) -> Self {
        Self::NotFound { resource_type }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<StoryError> for ApplicationError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::InvalidImage(_)
            | StoryError::ImageTooLarge { .. }
            | StoryError::EmptyMessage => Self::ValidationError(err.to_string()),
            StoryError::InvalidTransition { .. } | StoryError::StaleAnalysis(_) => {
                Self::InvalidState(err.to_string())
            }
            StoryError::NoStory => Self::not_found("Story"),
        }
    }
}

impl From<CredentialError> for ApplicationError {
    fn from(err: CredentialError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ModelError> for ApplicationError {
    fn from(err: ModelError) -> Self {
        Self::ExternalServiceError(err.to_string())
    }
}

impl From<PlaybackError> for ApplicationError {
    fn from(err: PlaybackError) -> Self {
        Self::PlaybackError(err.to_string())
    }
}
