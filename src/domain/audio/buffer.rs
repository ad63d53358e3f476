//! Audio Context - DecodedAudioBuffer

use super::AudioError;

/// 解码后的音频缓冲区
///
/// 不变量:
/// - 至少一个声道，采样率 > 0
/// - 每个声道长度都等于 `frame_count`
/// - 创建后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    sample_rate: u32,
    frame_count: usize,
    channel_data: Vec<Vec<f32>>,
}

impl DecodedAudioBuffer {
    /// 从按声道分离的样本创建缓冲区
    pub fn from_channels(sample_rate: u32, channel_data: Vec<Vec<f32>>) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidFormat("sample rate must be positive".to_string()));
        }
        if channel_data.is_empty() || channel_data.len() > u16::MAX as usize {
            return Err(AudioError::InvalidFormat(format!(
                "invalid channel count: {}",
                channel_data.len()
            )));
        }

        let frame_count = channel_data[0].len();
        if channel_data.iter().any(|c| c.len() != frame_count) {
            return Err(AudioError::InvalidFormat(
                "all channels must have the same length".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            frame_count,
            channel_data,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> u16 {
        self.channel_data.len() as u16
    }

    /// 每声道样本数
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channel_data.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channel_data
    }

    pub fn duration_ms(&self) -> u64 {
        (self.frame_count as u64 * 1000) / self.sample_rate as u64
    }

    /// 按输出设备参数渲染交错样本
    ///
    /// 采样率不同时做线性插值重采样；声道数不同时：
    /// 目标为单声道取各声道平均，否则目标声道 k 取源声道 min(k, n-1)
    pub fn render_interleaved(&self, target_rate: u32, target_channels: u16) -> Vec<f32> {
        let target_channels = target_channels.max(1) as usize;
        let source_channels = self.channel_data.len();

        let mapped: Vec<Vec<f32>> = if target_channels == source_channels {
            self.channel_data.clone()
        } else if target_channels == 1 {
            let scale = 1.0 / source_channels as f32;
            vec![(0..self.frame_count)
                .map(|i| self.channel_data.iter().map(|c| c[i]).sum::<f32>() * scale)
                .collect()]
        } else {
            (0..target_channels)
                .map(|k| self.channel_data[k.min(source_channels - 1)].clone())
                .collect()
        };

        let resampled: Vec<Vec<f32>> = if target_rate == 0 || target_rate == self.sample_rate {
            mapped
        } else {
            mapped
                .iter()
                .map(|c| resample_linear(c, self.sample_rate, target_rate))
                .collect()
        };

        let frames = resampled.first().map(Vec::len).unwrap_or(0);
        let mut interleaved = Vec::with_capacity(frames * target_channels);
        for i in 0..frames {
            for channel in &resampled {
                interleaved.push(channel[i]);
            }
        }
        interleaved
    }

    /// 导出为 16-bit PCM WAV
    ///
    /// 量化与解码的 `/32768` 归一化互逆，解码得到的缓冲区导出后 data chunk 与原始字节一致
    pub fn to_wav(&self) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let num_channels = self.num_channels();
        let byte_rate = self.sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
        let block_align = num_channels * (bits_per_sample / 8);

        let data_size = self.frame_count * num_channels as usize * 2;
        let file_size = 36 + data_size;

        let mut wav = Vec::with_capacity(44 + data_size);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(file_size as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&self.sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());

        for i in 0..self.frame_count {
            for channel in &self.channel_data {
                let quantized = (channel[i] * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
                wav.extend_from_slice(&quantized.to_le_bytes());
            }
        }

        wav
    }
}

/// 简单线性重采样（单声道）
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() || from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    let last = samples.len() - 1;

    (0..new_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let src_idx = (src_pos as usize).min(last);
            let frac = (src_pos - src_idx as f64) as f32;
            let s0 = samples[src_idx];
            let s1 = samples[(src_idx + 1).min(last)];
            s0 + (s1 - s0) * frac
        })
        .collect()
}
