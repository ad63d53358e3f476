//! Story Session Port - 故事会话状态管理
//!
//! 管理工作流状态、对话记录和当前故事的播放控制器，所有状态存储在内存中

use std::sync::Arc;

use crate::application::playback::PlaybackController;
use crate::domain::story::{
    AnalysisTicket, ChatMessage, ImageUpload, StoryContext, StoryError, StoryId, WorkflowState,
};

/// Story Session Port
pub trait StorySessionPort: Send + Sync {
    /// 当前工作流状态快照
    fn state(&self) -> WorkflowState;

    /// 开始分析新图片
    ///
    /// 丢弃上一个故事的对话记录和播放控制器（含朗读缓存）
    fn begin_analysis(&self, image: Arc<ImageUpload>) -> Result<AnalysisTicket, StoryError>;

    /// 应用分析结果，为新故事创建播放控制器
    fn complete_analysis(
        &self,
        ticket: AnalysisTicket,
        story: StoryContext,
    ) -> Result<StoryId, StoryError>;

    /// 记录分析失败
    fn fail_analysis(&self, ticket: AnalysisTicket, message: &str) -> Result<(), StoryError>;

    /// 重置工作流，释放播放资源并清空对话
    fn reset(&self);

    /// 当前展示的故事
    fn current_story(&self) -> Option<(StoryId, StoryContext)>;

    /// 当前故事的播放控制器
    fn playback(&self) -> Option<Arc<PlaybackController>>;

    /// 对话记录快照
    fn transcript(&self) -> Vec<ChatMessage>;

    /// 追加对话消息
    ///
    /// 故事已被替换或重置时返回 `StoryError::NoStory`，消息被丢弃
    fn append_message(&self, story_id: StoryId, message: ChatMessage) -> Result<(), StoryError>;

    /// 占用对话通道；已有对话请求进行中时返回 false
    fn try_begin_chat(&self) -> bool;

    /// 释放对话通道
    fn end_chat(&self);
}
