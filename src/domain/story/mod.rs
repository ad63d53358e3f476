//! Story Context - 故事限界上下文
//!
//! 职责:
//! - 图片上传校验
//! - 故事语义（情绪、场景、细节、开篇段落）
//! - 上传 → 分析 → 展示 工作流
//! - 对话记录

mod chat;
mod errors;
mod value_objects;
mod workflow;

pub use chat::{ChatMessage, ChatRole, ChatTranscript, CHAT_FAILED_REPLY};
pub use errors::StoryError;
pub use value_objects::{ImageUpload, StoryContext, StoryId, DEFAULT_IMAGE_MIME};
pub use workflow::{AnalysisTicket, StoryWorkflow, WorkflowState, ANALYSIS_FAILED_MESSAGE};
