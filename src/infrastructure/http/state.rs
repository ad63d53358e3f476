//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    AnalyzeImageHandler, NarrateStoryHandler, ResetStoryHandler, SendChatMessageHandler,
    SetApiKeyHandler,
    // Query handlers
    GetNarrationAudioHandler, GetStoryHandler, GetTranscriptHandler,
    // Ports
    CredentialStorePort, GenerativeModelPort, SpeechEnginePort, StorySessionPort,
};
use crate::infrastructure::events::EventPublisher;

/// 故事工作流选项
#[derive(Debug, Clone)]
pub struct StoryOptions {
    /// 上传图片解码后的最大字节数
    pub max_image_bytes: usize,
    /// 对话时是否回放历史轮次
    pub replay_history: bool,
}

impl Default for StoryOptions {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * 1024 * 1024,
            replay_history: true,
        }
    }
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub session: Arc<dyn StorySessionPort>,
    pub credentials: Arc<dyn CredentialStorePort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub set_api_key_handler: SetApiKeyHandler,
    pub analyze_image_handler: AnalyzeImageHandler,
    pub reset_story_handler: ResetStoryHandler,
    pub narrate_story_handler: NarrateStoryHandler,
    pub send_chat_message_handler: SendChatMessageHandler,

    // ========== Query Handlers ==========
    pub get_story_handler: GetStoryHandler,
    pub get_transcript_handler: GetTranscriptHandler,
    pub get_narration_audio_handler: GetNarrationAudioHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        session: Arc<dyn StorySessionPort>,
        credentials: Arc<dyn CredentialStorePort>,
        model: Arc<dyn GenerativeModelPort>,
        speech: Arc<dyn SpeechEnginePort>,
        event_publisher: Arc<EventPublisher>,
        options: StoryOptions,
    ) -> Self {
        Self {
            // Ports
            session: session.clone(),
            credentials: credentials.clone(),
            event_publisher: event_publisher.clone(),

            // Command handlers
            set_api_key_handler: SetApiKeyHandler::new(credentials.clone()),
            analyze_image_handler: AnalyzeImageHandler::new(
                session.clone(),
                model.clone(),
                credentials.clone(),
                event_publisher.clone(),
                options.max_image_bytes,
            ),
            reset_story_handler: ResetStoryHandler::new(session.clone(), event_publisher.clone()),
            narrate_story_handler: NarrateStoryHandler::new(
                session.clone(),
                speech,
                credentials.clone(),
                event_publisher.clone(),
            ),
            send_chat_message_handler: SendChatMessageHandler::new(
                session.clone(),
                model,
                credentials,
                options.replay_history,
            ),

            // Query handlers
            get_story_handler: GetStoryHandler::new(session.clone()),
            get_transcript_handler: GetTranscriptHandler::new(session.clone()),
            get_narration_audio_handler: GetNarrationAudioHandler::new(session),
        }
    }
}
