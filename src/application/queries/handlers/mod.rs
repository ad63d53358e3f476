//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod audio_handlers;
mod chat_handlers;
mod story_handlers;

pub use audio_handlers::*;
pub use chat_handlers::*;
pub use story_handlers::*;
