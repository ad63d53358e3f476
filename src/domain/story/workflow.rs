//! Story Context - 工作流状态机
//!
//! 上传 → 分析 → 展示 的线性流程，用带标签的状态表达，
//! 不存在 "加载中同时带错误" 之类的非法组合

use std::sync::Arc;

use super::{ImageUpload, StoryContext, StoryError, StoryId};

/// 分析失败时展示给用户的提示
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "The muse is silent today. Please check your connection or try another image.";

/// 一次分析请求的凭据
///
/// 请求返回时只有 ticket 仍与当前 Loading 状态匹配才会被应用，
/// 期间发生 reset 或新的上传则结果被丢弃
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisTicket(u64);

impl AnalysisTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// 工作流状态
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Loading {
        ticket: AnalysisTicket,
        image: Arc<ImageUpload>,
    },
    Displaying {
        story_id: StoryId,
        image: Arc<ImageUpload>,
        story: StoryContext,
    },
    Error {
        image: Option<Arc<ImageUpload>>,
        message: String,
    },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Loading { .. } => "loading",
            WorkflowState::Displaying { .. } => "displaying",
            WorkflowState::Error { .. } => "error",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, WorkflowState::Loading { .. })
    }
}

/// 工作流
#[derive(Debug)]
pub struct StoryWorkflow {
    state: WorkflowState,
    next_ticket: u64,
}

impl StoryWorkflow {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// 开始分析新图片
    ///
    /// 分析进行中时拒绝（上传入口在加载期间不可用）
    pub fn begin_analysis(&mut self, image: Arc<ImageUpload>) -> Result<AnalysisTicket, StoryError> {
        if self.state.is_loading() {
            return Err(StoryError::InvalidTransition {
                state: self.state.name(),
                action: "begin_analysis",
            });
        }

        let ticket = AnalysisTicket(self.next_ticket);
        self.next_ticket += 1;
        self.state = WorkflowState::Loading { ticket, image };
        Ok(ticket)
    }

    /// 分析成功，进入展示状态
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        story: StoryContext,
    ) -> Result<StoryId, StoryError> {
        let image = self.take_loading_image(ticket)?;
        let story_id = StoryId::new();
        self.state = WorkflowState::Displaying {
            story_id,
            image,
            story,
        };
        Ok(story_id)
    }

    /// 分析失败，进入错误状态
    pub fn fail_analysis(
        &mut self,
        ticket: AnalysisTicket,
        message: impl Into<String>,
    ) -> Result<(), StoryError> {
        let image = self.take_loading_image(ticket)?;
        self.state = WorkflowState::Error {
            image: Some(image),
            message: message.into(),
        };
        Ok(())
    }

    /// 回到初始状态（任意状态均可）
    pub fn reset(&mut self) {
        self.state = WorkflowState::Idle;
    }

    /// 当前展示的故事
    pub fn displayed(&self) -> Option<(StoryId, &StoryContext)> {
        match &self.state {
            WorkflowState::Displaying { story_id, story, .. } => Some((*story_id, story)),
            _ => None,
        }
    }

    fn take_loading_image(&self, ticket: AnalysisTicket) -> Result<Arc<ImageUpload>, StoryError> {
        match &self.state {
            WorkflowState::Loading {
                ticket: current,
                image,
            } if *current == ticket => Ok(image.clone()),
            _ => Err(StoryError::StaleAnalysis(ticket.0)),
        }
    }
}

impl Default for StoryWorkflow {
    fn default() -> Self {
        Self::new()
    }
}
