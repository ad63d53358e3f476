//! Audio Output - 输出后端实现
//!
//! - cpal: 默认声卡输出
//! - silent: 无设备环境，按时长模拟播放

mod cpal_output;
mod silent_output;

pub use cpal_output::CpalAudioOutput;
pub use silent_output::SilentAudioOutput;
