//! Speech Engine Port - 语音合成抽象
//!
//! 远程模型返回 base64 编码的单声道 16-bit PCM，
//! 实现方负责经 base64 → PCM 解码得到可播放的缓冲区

use async_trait::async_trait;

use super::ModelError;
use crate::domain::audio::DecodedAudioBuffer;
use crate::domain::ApiKey;

/// 合成音频的采样率（由远程服务的输出格式决定，不可配置）
pub const NARRATION_SAMPLE_RATE: u32 = 24000;

/// 合成音频的声道数
pub const NARRATION_CHANNELS: u16 = 1;

/// Speech Engine Port
#[async_trait]
pub trait SpeechEnginePort: Send + Sync {
    /// 朗读给定文本
    ///
    /// 单次请求，不重试；响应中没有音频时返回 `ModelError::NoAudioGenerated`
    async fn synthesize(
        &self,
        text: &str,
        api_key: &ApiKey,
    ) -> Result<DecodedAudioBuffer, ModelError>;

    /// 固定使用的音色名称（参与朗读缓存 key）
    fn voice_name(&self) -> &str;
}
