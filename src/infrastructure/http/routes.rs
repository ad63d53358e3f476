//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/credentials/set      POST  设置 API Key
//! - /api/credentials/status   GET   API Key 是否已配置
//! - /api/story/analyze        POST  上传图片并生成故事开篇
//! - /api/story/get            GET   当前工作流状态
//! - /api/story/reset          POST  重置工作流
//! - /api/story/narrate        POST  朗读开篇（结束通过 WS 通知）
//! - /api/story/narration      GET   下载已缓存的朗读音频（WAV）
//! - /api/chat/send            POST  发送对话消息
//! - /api/chat/messages        GET   对话记录
//! - /ws/events                WS    工作流与朗读事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/credentials", credential_routes())
        .nest("/story", story_routes())
        .nest("/chat", chat_routes())
}

/// Credentials 路由
fn credential_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/set", post(handlers::set_api_key))
        .route("/status", get(handlers::credential_status))
}

/// Story 路由
fn story_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analyze", post(handlers::analyze_image))
        .route("/get", get(handlers::get_story))
        .route("/reset", post(handlers::reset_story))
        .route("/narrate", post(handlers::narrate_story))
        .route("/narration", get(handlers::get_narration_audio))
}

/// Chat 路由
fn chat_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/send", post(handlers::send_chat_message))
        .route("/messages", get(handlers::get_chat_messages))
}
