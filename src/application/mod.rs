//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（GenerativeModel、SpeechEngine、AudioOutput、StorySession 等）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - playback: 朗读播放控制
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod playback;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Credential commands
    SetApiKeyCommand,
    // Story commands
    AnalyzeImageCommand,
    AnalyzeImageResponse,
    NarrateStoryCommand,
    NarrationOutcome,
    ResetStoryCommand,
    // Chat commands
    SendChatMessageCommand,
    SendChatMessageResponse,
    // Handlers
    handlers::{
        chat_system_instruction, AnalyzeImageHandler, NarrateStoryHandler, ResetStoryHandler,
        SendChatMessageHandler, SetApiKeyHandler,
    },
};

pub use error::ApplicationError;

pub use playback::{narration_cache_key, PlayOutcome, PlaybackClaim, PlaybackController};

pub use ports::{
    // Audio output
    AudioContextPort,
    AudioOutputPort,
    OnEnded,
    PlaybackError,
    // Credentials
    CredentialStorePort,
    // Remote model
    ChatRequest,
    GenerativeModelPort,
    ModelError,
    SpeechEnginePort,
    NARRATION_CHANNELS,
    NARRATION_SAMPLE_RATE,
    // Session
    StorySessionPort,
};

pub use queries::{
    GetNarrationAudioQuery,
    GetNarrationAudioResponse,
    GetStoryQuery,
    GetTranscriptQuery,
    GetTranscriptResponse,
    StoryView,
    // Handlers
    handlers::{GetNarrationAudioHandler, GetStoryHandler, GetTranscriptHandler},
};
