//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_output;
mod credential_store;
mod generative_model;
mod speech_engine;
mod story_session;

pub use audio_output::{AudioContextPort, AudioOutputPort, OnEnded, PlaybackError};
pub use credential_store::CredentialStorePort;
pub use generative_model::{ChatRequest, GenerativeModelPort, ModelError};
pub use speech_engine::{SpeechEnginePort, NARRATION_CHANNELS, NARRATION_SAMPLE_RATE};
pub use story_session::StorySessionPort;
