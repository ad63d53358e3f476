//! Audio Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("base64 解码失败: {0}")]
    Decoding(String),

    #[error("音频数据格式错误: {len} 字节不是 {frame_bytes} 字节帧长的整数倍")]
    MalformedAudio { len: usize, frame_bytes: usize },

    #[error("无效的音频参数: {0}")]
    InvalidFormat(String),
}
