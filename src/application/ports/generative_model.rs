//! Generative Model Port - 远程生成模型抽象
//!
//! 图片分析与对话；语音合成见 `speech_engine`

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioError;
use crate::domain::story::{ChatMessage, ImageUpload, StoryContext};
use crate::domain::ApiKey;

/// 远程模型错误
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No audio generated")]
    NoAudioGenerated,

    #[error("Audio decode error: {0}")]
    Audio(#[from] AudioError),
}

/// 对话请求
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// 携带故事上下文的系统指令
    pub system_instruction: String,
    /// 之前的对话轮次（不含本次消息）；为空时即单轮请求
    pub history: Vec<ChatMessage>,
    /// 本次用户消息
    pub message: String,
}

/// Generative Model Port
#[async_trait]
pub trait GenerativeModelPort: Send + Sync {
    /// 分析图片并生成故事开篇
    ///
    /// 模型响应缺失或无法解析时按空对象处理（各字段为空），不视为错误
    async fn analyze_image(
        &self,
        image: &ImageUpload,
        api_key: &ApiKey,
    ) -> Result<StoryContext, ModelError>;

    /// 发送一条对话消息，返回模型回复文本
    async fn chat(&self, request: ChatRequest, api_key: &ApiKey) -> Result<String, ModelError>;
}
