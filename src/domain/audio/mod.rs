//! Audio Context - 音频限界上下文
//!
//! 职责:
//! - base64 传输编码
//! - 16-bit PCM 解码与归一化
//! - 解码后音频缓冲区（重采样渲染、WAV 导出）

mod buffer;
mod codec;
mod errors;
mod pcm;

pub use buffer::DecodedAudioBuffer;
pub use codec::{decode_base64, encode_base64};
pub use errors::AudioError;
pub use pcm::{decode_pcm16, PCM16_BYTES_PER_SAMPLE};
