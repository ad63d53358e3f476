//! Story Commands - 故事工作流相关命令

use crate::domain::story::{StoryId, WorkflowState};

/// 分析图片命令
#[derive(Debug, Clone)]
pub struct AnalyzeImageCommand {
    /// data URL 或裸 base64
    pub image: String,
}

/// 分析图片响应
#[derive(Debug, Clone)]
pub struct AnalyzeImageResponse {
    /// 请求结束时的工作流状态（Displaying 或 Error；期间被重置时为最新状态）
    pub state: WorkflowState,
}

/// 重置工作流命令
#[derive(Debug, Clone, Default)]
pub struct ResetStoryCommand;

/// 朗读当前故事命令
#[derive(Debug, Clone, Default)]
pub struct NarrateStoryCommand;

/// 朗读结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationOutcome {
    /// 已开始播放
    Started {
        story_id: StoryId,
        duration_ms: u64,
        cached: bool,
    },
    /// 已有播放进行中，请求被忽略
    AlreadyPlaying,
    /// 没有可朗读的开篇段落
    NothingToNarrate,
    /// 合成期间故事已被替换或重置，结果被丢弃
    Discarded,
    /// 合成或播放失败，播放状态已复位
    Failed { error: String },
}

impl NarrationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrationOutcome::Started { .. } => "started",
            NarrationOutcome::AlreadyPlaying => "already_playing",
            NarrationOutcome::NothingToNarrate => "nothing_to_narrate",
            NarrationOutcome::Discarded => "discarded",
            NarrationOutcome::Failed { .. } => "failed",
        }
    }
}
