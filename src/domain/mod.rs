//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Audio Context: base64 / PCM 解码与音频缓冲区
//! - Story Context: 故事工作流与对话

pub mod audio;
pub mod story;

// 共享的凭据值对象
mod credentials;

pub use credentials::{ApiKey, CredentialError};
