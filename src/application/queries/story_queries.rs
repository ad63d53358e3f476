//! Story Queries - 工作流状态查询

use crate::domain::story::{StoryContext, StoryId, WorkflowState};

/// 获取当前工作流状态
#[derive(Debug, Clone, Default)]
pub struct GetStoryQuery;

/// 工作流状态视图
///
/// 展示层需要的全部信息：状态名、图片预览、故事内容、错误提示和播放状态
#[derive(Debug, Clone)]
pub struct StoryView {
    pub state: &'static str,
    pub story_id: Option<StoryId>,
    /// 图片预览（data URL）
    pub image: Option<String>,
    pub story: Option<StoryContext>,
    pub error: Option<String>,
    pub is_playing: bool,
    /// 当前故事是否已有缓存的朗读音频
    pub has_narration: bool,
}

impl StoryView {
    pub fn from_state(state: WorkflowState, is_playing: bool, has_narration: bool) -> Self {
        let mut view = StoryView {
            state: state.name(),
            story_id: None,
            image: None,
            story: None,
            error: None,
            is_playing,
            has_narration,
        };

        match state {
            WorkflowState::Idle => {}
            WorkflowState::Loading { image, .. } => {
                view.image = Some(image.data_url());
            }
            WorkflowState::Displaying {
                story_id,
                image,
                story,
            } => {
                view.story_id = Some(story_id);
                view.image = Some(image.data_url());
                view.story = Some(story);
            }
            WorkflowState::Error { image, message } => {
                view.image = image.map(|i| i.data_url());
                view.error = Some(message);
            }
        }

        view
    }
}
