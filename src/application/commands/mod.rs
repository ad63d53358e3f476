//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod chat_commands;
mod credential_commands;
mod story_commands;

pub mod handlers;

pub use chat_commands::*;
pub use credential_commands::*;
pub use story_commands::*;
