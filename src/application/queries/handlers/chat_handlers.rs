//! Chat Query Handlers

use std::sync::Arc;

use crate::application::ports::StorySessionPort;
use crate::application::queries::{GetTranscriptQuery, GetTranscriptResponse};

/// GetTranscript Handler - 当前故事的对话记录
pub struct GetTranscriptHandler {
    session: Arc<dyn StorySessionPort>,
}

impl GetTranscriptHandler {
    pub fn new(session: Arc<dyn StorySessionPort>) -> Self {
        Self { session }
    }

    pub fn handle(&self, _query: GetTranscriptQuery) -> GetTranscriptResponse {
        GetTranscriptResponse {
            messages: self.session.transcript(),
        }
    }
}
