//! Audio Output Port - 音频输出抽象
//!
//! `AudioOutputPort` 是输出后端（声卡 / 静默），
//! 由它打开的 `AudioContextPort` 归某一个故事展示独占，故事重置时释放

use std::sync::Arc;

use thiserror::Error;

use crate::domain::audio::DecodedAudioBuffer;

/// 播放错误
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("No output device available")]
    NoOutputDevice,

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Audio context closed")]
    ContextClosed,
}

/// 播放自然结束时的回调
pub type OnEnded = Box<dyn FnOnce() + Send + 'static>;

/// 音频输出上下文
pub trait AudioContextPort: Send + Sync {
    /// 立即开始播放缓冲区
    ///
    /// 返回 Ok 后，播放到缓冲区末尾或输出流失效时调用一次 `on_ended`；
    /// 返回 Err 或上下文被关闭时 `on_ended` 不会被调用。
    /// 输出流失效后上下文不可再用，`start` 返回 `ContextClosed`
    fn start(&self, buffer: Arc<DecodedAudioBuffer>, on_ended: OnEnded) -> Result<(), PlaybackError>;

    /// 停止当前播放并释放底层资源
    fn close(&self);
}

/// 音频输出后端
pub trait AudioOutputPort: Send + Sync {
    /// 打开新的输出上下文
    fn open_context(&self) -> Result<Arc<dyn AudioContextPort>, PlaybackError>;

    /// 后端名称（日志用）
    fn name(&self) -> &'static str;
}
