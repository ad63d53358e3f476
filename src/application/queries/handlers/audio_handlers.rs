//! Audio Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::StorySessionPort;
use crate::application::queries::{GetNarrationAudioQuery, GetNarrationAudioResponse};

/// GetNarrationAudio Handler - 导出已缓存的朗读音频为 WAV
pub struct GetNarrationAudioHandler {
    session: Arc<dyn StorySessionPort>,
}

impl GetNarrationAudioHandler {
    pub fn new(session: Arc<dyn StorySessionPort>) -> Self {
        Self { session }
    }

    pub fn handle(
        &self,
        _query: GetNarrationAudioQuery,
    ) -> Result<GetNarrationAudioResponse, ApplicationError> {
        let buffer = self
            .session
            .playback()
            .and_then(|playback| playback.narration())
            .ok_or_else(|| ApplicationError::not_found("Narration"))?;

        Ok(GetNarrationAudioResponse {
            audio_data: buffer.to_wav(),
            content_type: "audio/wav".to_string(),
        })
    }
}
