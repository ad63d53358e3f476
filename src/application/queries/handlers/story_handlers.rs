//! Story Query Handlers

use std::sync::Arc;

use crate::application::ports::StorySessionPort;
use crate::application::queries::{GetStoryQuery, StoryView};

/// GetStory Handler - 当前工作流状态视图
pub struct GetStoryHandler {
    session: Arc<dyn StorySessionPort>,
}

impl GetStoryHandler {
    pub fn new(session: Arc<dyn StorySessionPort>) -> Self {
        Self { session }
    }

    pub fn handle(&self, _query: GetStoryQuery) -> StoryView {
        let state = self.session.state();
        let playback = self.session.playback();
        let is_playing = playback.as_ref().is_some_and(|p| p.is_playing());
        let has_narration = playback.as_ref().is_some_and(|p| p.narration().is_some());

        StoryView::from_state(state, is_playing, has_narration)
    }
}
