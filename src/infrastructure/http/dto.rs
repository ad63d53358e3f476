//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{NarrationOutcome, StoryView};
use crate::domain::story::{ChatMessage, StoryContext};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Credential DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialStatusResponse {
    pub configured: bool,
}

// ============================================================================
// Story DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeImageRequest {
    /// data URL 或裸 base64
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct StoryContentResponse {
    pub mood: String,
    pub setting: String,
    pub key_details: Vec<String>,
    pub paragraph: String,
}

impl From<StoryContext> for StoryContentResponse {
    fn from(story: StoryContext) -> Self {
        Self {
            mood: story.mood().to_string(),
            setting: story.setting().to_string(),
            key_details: story.key_details().to_vec(),
            paragraph: story.paragraph().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoryViewResponse {
    /// idle | loading | displaying | error
    pub state: &'static str,
    pub story_id: Option<String>,
    pub image: Option<String>,
    pub story: Option<StoryContentResponse>,
    pub error: Option<String>,
    pub is_playing: bool,
    pub has_narration: bool,
}

impl From<StoryView> for StoryViewResponse {
    fn from(view: StoryView) -> Self {
        Self {
            state: view.state,
            story_id: view.story_id.map(|id| id.to_string()),
            image: view.image,
            story: view.story.map(StoryContentResponse::from),
            error: view.error,
            is_playing: view.is_playing,
            has_narration: view.has_narration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NarrateResponse {
    pub started: bool,
    /// started | already_playing | nothing_to_narrate | discarded | failed
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<NarrationOutcome> for NarrateResponse {
    fn from(outcome: NarrationOutcome) -> Self {
        let mut response = Self {
            started: false,
            outcome: outcome.as_str(),
            story_id: None,
            duration_ms: None,
            cached: None,
            error: None,
        };
        match outcome {
            NarrationOutcome::Started {
                story_id,
                duration_ms,
                cached,
            } => {
                response.started = true;
                response.story_id = Some(story_id.to_string());
                response.duration_ms = Some(duration_ms);
                response.cached = Some(cached);
            }
            NarrationOutcome::Failed { error } => {
                response.error = Some(error);
            }
            _ => {}
        }
        response
    }
}

// ============================================================================
// Chat DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SendChatMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReplyResponse {
    pub reply: String,
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    /// user | model
    pub role: &'static str,
    pub content: String,
    pub created_at: String,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatMessagesResponse {
    pub total: usize,
    pub messages: Vec<ChatMessageResponse>,
}
