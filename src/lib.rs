//! Ghostwriter - 看图写故事助手
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Audio Context: base64 编解码、PCM16 解码、音频缓冲区
//! - Story Context: 故事语义、工作流状态机、对话记录
//!
//! 应用层 (application/):
//! - Ports: 端口定义（GenerativeModel, SpeechEngine, AudioOutput, StorySession, CredentialStore）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//! - Playback: 朗读播放控制
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: StorySession, CredentialStore 内存实现
//! - Adapters: Gemini Client, Fake Model Client
//! - Audio: cpal 声卡输出, 静默输出
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
