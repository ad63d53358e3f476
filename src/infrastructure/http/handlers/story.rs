//! Story HTTP Handlers

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::application::{
    AnalyzeImageCommand, GetNarrationAudioQuery, GetStoryQuery, NarrateStoryCommand,
    ResetStoryCommand, StoryView,
};
use crate::infrastructure::http::dto::{
    AnalyzeImageRequest, ApiResponse, Empty, NarrateResponse, StoryViewResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 上传图片并等待分析结果
///
/// 分析失败不算请求错误：返回 error 状态的视图
pub async fn analyze_image(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeImageRequest>,
) -> Result<Json<ApiResponse<StoryViewResponse>>, ApiError> {
    let result = state
        .analyze_image_handler
        .handle(AnalyzeImageCommand { image: req.image })
        .await?;

    let view = StoryView::from_state(result.state, false, false);
    Ok(Json(ApiResponse::success(view.into())))
}

/// 当前工作流状态
pub async fn get_story(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StoryViewResponse>> {
    let view = state.get_story_handler.handle(GetStoryQuery);
    Json(ApiResponse::success(view.into()))
}

/// 重置工作流
pub async fn reset_story(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Empty>> {
    state.reset_story_handler.handle(ResetStoryCommand);
    Json(ApiResponse::ok())
}

/// 朗读当前故事，播放结束通过 WebSocket 通知
pub async fn narrate_story(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<NarrateResponse>>, ApiError> {
    let outcome = state
        .narrate_story_handler
        .handle(NarrateStoryCommand)
        .await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

/// 下载已缓存的朗读音频
pub async fn get_narration_audio(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let result = state
        .get_narration_audio_handler
        .handle(GetNarrationAudioQuery)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(header::CONTENT_LENGTH, result.audio_data.len())
        .body(Body::from(result.audio_data))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
