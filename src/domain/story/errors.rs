//! Story Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryError {
    #[error("无效的状态转换: 无法在 {state} 状态下执行 {action}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("分析结果已过期 (ticket {0})")]
    StaleAnalysis(u64),

    #[error("无效的图片: {0}")]
    InvalidImage(String),

    #[error("图片过大: {size} 字节 (上限 {limit} 字节)")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("消息不能为空")]
    EmptyMessage,

    #[error("当前没有可用的故事")]
    NoStory,
}
