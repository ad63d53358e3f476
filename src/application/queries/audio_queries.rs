//! Audio Queries - 朗读音频查询

/// 获取当前故事已缓存的朗读音频
#[derive(Debug, Clone, Default)]
pub struct GetNarrationAudioQuery;

/// 获取朗读音频响应
#[derive(Debug, Clone)]
pub struct GetNarrationAudioResponse {
    pub audio_data: Vec<u8>,
    pub content_type: String,
}
