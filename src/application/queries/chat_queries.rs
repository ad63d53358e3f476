//! Chat Queries - 对话记录查询

use crate::domain::story::ChatMessage;

/// 获取对话记录
#[derive(Debug, Clone, Default)]
pub struct GetTranscriptQuery;

#[derive(Debug, Clone)]
pub struct GetTranscriptResponse {
    pub messages: Vec<ChatMessage>,
}
