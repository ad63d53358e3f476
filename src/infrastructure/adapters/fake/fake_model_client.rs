//! Fake Model Client - 用于开发和测试的模型客户端
//!
//! 始终返回配置的固定故事和回复；语音合成走与真实客户端相同的
//! base64 → PCM16 解码路径

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::application::ports::{
    ChatRequest, GenerativeModelPort, ModelError, SpeechEnginePort, NARRATION_CHANNELS,
    NARRATION_SAMPLE_RATE,
};
use crate::domain::audio::{decode_base64, decode_pcm16, encode_base64, DecodedAudioBuffer};
use crate::domain::story::{ImageUpload, StoryContext};
use crate::domain::ApiKey;

/// Fake Model Client 配置
#[derive(Debug, Clone)]
pub struct FakeModelClientConfig {
    /// 固定返回的故事
    pub story: StoryContext,
    /// 固定返回的对话回复
    pub reply: String,
    /// 固定返回的 base64 PCM16 音频（24kHz 单声道）
    pub audio_base64: String,
    pub voice_name: String,
    /// 模拟请求延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeModelClientConfig {
    fn default() -> Self {
        // 0.5 秒 220Hz 正弦波
        let frames = NARRATION_SAMPLE_RATE as usize / 2;
        let pcm: Vec<u8> = (0..frames)
            .flat_map(|i| {
                let t = i as f32 / NARRATION_SAMPLE_RATE as f32;
                let sample = (t * 220.0 * std::f32::consts::TAU).sin() * 0.25;
                ((sample * i16::MAX as f32) as i16).to_le_bytes()
            })
            .collect();

        Self {
            story: StoryContext::new(
                "melancholic",
                "a lighthouse on a storm-battered cliff",
                vec![
                    "a cracked lantern".to_string(),
                    "gulls circling".to_string(),
                    "a door left ajar".to_string(),
                ],
                "The lamp had not turned in eleven years, yet tonight its beam swept the water once, as if looking for someone.",
            ),
            reply: "Perhaps the keeper never left at all.".to_string(),
            audio_base64: encode_base64(&pcm),
            voice_name: "Kore".to_string(),
            latency_ms: 0,
        }
    }
}

/// Fake Model Client
pub struct FakeModelClient {
    config: FakeModelClientConfig,
    failing: AtomicBool,
    analyze_calls: AtomicUsize,
    synthesize_calls: AtomicUsize,
    chat_calls: AtomicUsize,
    last_chat_request: Mutex<Option<ChatRequest>>,
}

impl FakeModelClient {
    pub fn new(config: FakeModelClientConfig) -> Self {
        tracing::info!(
            voice_name = %config.voice_name,
            latency_ms = config.latency_ms,
            "FakeModelClient initialized"
        );
        Self {
            config,
            failing: AtomicBool::new(false),
            analyze_calls: AtomicUsize::new(0),
            synthesize_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            last_chat_request: Mutex::new(None),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeModelClientConfig::default())
    }

    /// 之后的所有请求返回服务错误
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn synthesize_calls(&self) -> usize {
        self.synthesize_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn last_chat_request(&self) -> Option<ChatRequest> {
        self.last_chat_request.lock().clone()
    }

    async fn simulate_request(&self) -> Result<(), ModelError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ModelError::ServiceError("fake failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GenerativeModelPort for FakeModelClient {
    async fn analyze_image(
        &self,
        image: &ImageUpload,
        _api_key: &ApiKey,
    ) -> Result<StoryContext, ModelError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            mime_type = %image.mime_type(),
            image_bytes = image.byte_len(),
            "FakeModelClient: returning fixed story"
        );
        self.simulate_request().await?;
        Ok(self.config.story.clone())
    }

    async fn chat(&self, request: ChatRequest, _api_key: &ApiKey) -> Result<String, ModelError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_chat_request.lock() = Some(request);
        self.simulate_request().await?;
        Ok(self.config.reply.clone())
    }
}

#[async_trait]
impl SpeechEnginePort for FakeModelClient {
    async fn synthesize(
        &self,
        text: &str,
        _api_key: &ApiKey,
    ) -> Result<DecodedAudioBuffer, ModelError> {
        self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(text_len = text.len(), "FakeModelClient: returning fixed audio");
        self.simulate_request().await?;

        let raw = decode_base64(&self.config.audio_base64)?;
        Ok(decode_pcm16(&raw, NARRATION_SAMPLE_RATE, NARRATION_CHANNELS)?)
    }

    fn voice_name(&self) -> &str {
        &self.config.voice_name
    }
}
