//! Gemini Client - 调用 Gemini REST API
//!
//! POST {base_url}/v1beta/models/{model}:generateContent
//! Header: x-goog-api-key
//!
//! - 图片分析：内联图片 + 固定指令，要求 JSON 结构化输出
//! - 语音合成：AUDIO 响应模态，返回 base64 编码的 24kHz 单声道 PCM16
//! - 对话：系统指令携带故事上下文，可选回放历史轮次

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::types::{
    AnalysisPayload, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part, SpeechConfig,
};
use crate::application::ports::{
    ChatRequest, GenerativeModelPort, ModelError, SpeechEnginePort, NARRATION_CHANNELS,
    NARRATION_SAMPLE_RATE,
};
use crate::domain::audio::{decode_base64, decode_pcm16, DecodedAudioBuffer};
use crate::domain::story::{ImageUpload, StoryContext};
use crate::domain::ApiKey;

const ANALYSIS_INSTRUCTION: &str = "Analyze this image and write a compelling opening paragraph for a story set in this scene. Return the response in a structured JSON format with: 'mood', 'setting', 'keyDetails' (array), and 'paragraph'.";

/// Gemini 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// 图片分析模型
    pub analysis_model: String,
    /// 语音合成模型
    pub speech_model: String,
    /// 对话模型
    pub chat_model: String,
    /// 预置音色
    pub voice_name: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            analysis_model: "gemini-2.0-flash".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            chat_model: "gemini-2.0-flash".to_string(),
            voice_name: "Kore".to_string(),
            timeout_secs: 120,
        }
    }
}

impl GeminiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_voice(mut self, voice_name: impl Into<String>) -> Self {
        self.voice_name = voice_name.into();
        self
    }
}

/// Gemini 客户端
pub struct GeminiClient {
    client: Client,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn with_default_config() -> Result<Self, ModelError> {
        Self::new(GeminiClientConfig::default())
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        api_key: &ApiKey,
    ) -> Result<GenerateContentResponse, ModelError> {
        let url = self.generate_url(model);
        tracing::debug!(url = %url, contents = request.contents.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout
                } else if e.is_connect() {
                    ModelError::NetworkError(format!("Cannot connect to model service: {}", e))
                } else {
                    ModelError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

/// 图片分析请求
fn analysis_request(image: &ImageUpload) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: None,
            parts: vec![
                Part::inline(image.mime_type(), image.data()),
                Part::text(ANALYSIS_INSTRUCTION),
            ],
        }],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(json!({
                "type": "OBJECT",
                "properties": {
                    "mood": { "type": "STRING" },
                    "setting": { "type": "STRING" },
                    "keyDetails": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "paragraph": { "type": "STRING" }
                },
                "required": ["mood", "setting", "keyDetails", "paragraph"]
            })),
            ..Default::default()
        }),
    }
}

/// 语音合成请求
fn speech_request(text: &str, voice_name: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::text(
            None,
            format!(
                "Narrate this story opening with deep emotion and atmosphere: {}",
                text
            ),
        )],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(SpeechConfig::prebuilt(voice_name)),
            ..Default::default()
        }),
    }
}

/// 对话请求：历史轮次在前，本次消息在最后
fn chat_request(request: &ChatRequest) -> GenerateContentRequest {
    let mut contents: Vec<Content> = request
        .history
        .iter()
        .map(|m| Content::text(Some(m.role.as_str()), m.content.clone()))
        .collect();
    contents.push(Content::text(Some("user"), request.message.clone()));

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::text(None, request.system_instruction.clone())),
        generation_config: None,
    }
}

/// 解析分析结果；文本缺失或无法解析时按空对象处理
fn parse_analysis(text: Option<&str>) -> StoryContext {
    let payload = match text {
        Some(text) => serde_json::from_str::<AnalysisPayload>(text).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Analysis response is not valid JSON, using empty story");
            AnalysisPayload::default()
        }),
        None => {
            tracing::warn!("Analysis response has no text, using empty story");
            AnalysisPayload::default()
        }
    };

    StoryContext::new(
        payload.mood,
        payload.setting,
        payload.key_details,
        payload.paragraph,
    )
}

#[async_trait]
impl GenerativeModelPort for GeminiClient {
    async fn analyze_image(
        &self,
        image: &ImageUpload,
        api_key: &ApiKey,
    ) -> Result<StoryContext, ModelError> {
        let response = self
            .generate(&self.config.analysis_model, &analysis_request(image), api_key)
            .await?;
        let story = parse_analysis(response.first_text().as_deref());

        tracing::info!(
            mood = %story.mood(),
            key_details = story.key_details().len(),
            paragraph_len = story.paragraph().len(),
            "Image analysis response received"
        );
        Ok(story)
    }

    async fn chat(&self, request: ChatRequest, api_key: &ApiKey) -> Result<String, ModelError> {
        let response = self
            .generate(&self.config.chat_model, &chat_request(&request), api_key)
            .await?;
        Ok(response.first_text().unwrap_or_default())
    }
}

#[async_trait]
impl SpeechEnginePort for GeminiClient {
    async fn synthesize(
        &self,
        text: &str,
        api_key: &ApiKey,
    ) -> Result<DecodedAudioBuffer, ModelError> {
        let response = self
            .generate(
                &self.config.speech_model,
                &speech_request(text, &self.config.voice_name),
                api_key,
            )
            .await?;

        let inline = response
            .first_audio_data()
            .ok_or(ModelError::NoAudioGenerated)?;
        let raw = decode_base64(&inline.data)?;
        let buffer = decode_pcm16(&raw, NARRATION_SAMPLE_RATE, NARRATION_CHANNELS)?;

        tracing::info!(
            text_len = text.len(),
            audio_bytes = raw.len(),
            frame_count = buffer.frame_count(),
            duration_ms = buffer.duration_ms(),
            "Speech synthesis completed"
        );
        Ok(buffer)
    }

    fn voice_name(&self) -> &str {
        &self.config.voice_name
    }
}
