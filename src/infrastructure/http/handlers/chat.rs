//! Chat HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{GetTranscriptQuery, SendChatMessageCommand};
use crate::infrastructure::http::dto::{
    ApiResponse, ChatMessageResponse, ChatMessagesResponse, ChatReplyResponse,
    SendChatMessageRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 发送对话消息
pub async fn send_chat_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendChatMessageRequest>,
) -> Result<Json<ApiResponse<ChatReplyResponse>>, ApiError> {
    let result = state
        .send_chat_message_handler
        .handle(SendChatMessageCommand {
            message: req.message,
        })
        .await?;

    Ok(Json(ApiResponse::success(ChatReplyResponse {
        reply: result.reply,
        degraded: result.degraded,
    })))
}

/// 对话记录
pub async fn get_chat_messages(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<ChatMessagesResponse>> {
    let messages: Vec<ChatMessageResponse> = state
        .get_transcript_handler
        .handle(GetTranscriptQuery)
        .messages
        .into_iter()
        .map(ChatMessageResponse::from)
        .collect();

    Json(ApiResponse::success(ChatMessagesResponse {
        total: messages.len(),
        messages,
    }))
}
