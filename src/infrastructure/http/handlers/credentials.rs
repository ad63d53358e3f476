//! Credential HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::SetApiKeyCommand;
use crate::infrastructure::http::dto::{
    ApiResponse, CredentialStatusResponse, Empty, SetApiKeyRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 设置 API Key
pub async fn set_api_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetApiKeyRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.set_api_key_handler.handle(SetApiKeyCommand {
        api_key: req.api_key,
    })?;
    Ok(Json(ApiResponse::ok()))
}

/// API Key 是否已配置
pub async fn credential_status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<CredentialStatusResponse>> {
    Json(ApiResponse::success(CredentialStatusResponse {
        configured: state.credentials.is_configured(),
    }))
}
