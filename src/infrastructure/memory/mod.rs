//! Memory Layer - In-Memory State Management
//!
//! 实现 CredentialStore 和 StorySession，所有状态只存在于进程内存

mod credential_store;
mod story_session;

pub use credential_store::InMemoryCredentialStore;
pub use story_session::InMemoryStorySession;
