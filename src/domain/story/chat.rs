//! Story Context - 对话记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoryError;

/// 对话失败时写入记录的回复
pub const CHAT_FAILED_REPLY: &str = "Sorry, I lost my train of thought. Can we try again?";

/// 对话角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// 用户消息，空白内容被拒绝
    pub fn user(content: impl Into<String>) -> Result<Self, StoryError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(StoryError::EmptyMessage);
        }
        Ok(Self {
            role: ChatRole::User,
            content,
            created_at: Utc::now(),
        })
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// 内存中的对话记录，只在当前故事展示期间存在
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
