//! PCM 解码器
//!
//! 将小端 16-bit 有符号交错 PCM 转换为按声道分离的归一化浮点样本

use super::{AudioError, DecodedAudioBuffer};

/// 16-bit PCM 每个样本的字节数
pub const PCM16_BYTES_PER_SAMPLE: usize = 2;

/// 归一化除数
///
/// 保持 `/32768` 的非对称缩放：-32768 映射为 -1.0，32767 映射为略小于 1.0
const PCM16_SCALE: f32 = 32768.0;

/// 解码 16-bit 小端 PCM
///
/// 交错位置 `i * num_channels + c` 的样本写入 `channel_data[c][i]`。
/// 字节长度不是 `2 * num_channels` 的整数倍时返回 `MalformedAudio`，不做截断。
pub fn decode_pcm16(
    raw: &[u8],
    sample_rate: u32,
    num_channels: u16,
) -> Result<DecodedAudioBuffer, AudioError> {
    if sample_rate == 0 {
        return Err(AudioError::InvalidFormat("sample rate must be positive".to_string()));
    }
    if num_channels == 0 {
        return Err(AudioError::InvalidFormat("channel count must be positive".to_string()));
    }

    let channels = num_channels as usize;
    let frame_bytes = PCM16_BYTES_PER_SAMPLE * channels;
    if raw.len() % frame_bytes != 0 {
        return Err(AudioError::MalformedAudio {
            len: raw.len(),
            frame_bytes,
        });
    }

    let frame_count = raw.len() / frame_bytes;
    let mut channel_data: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(frame_count))
        .collect();

    for frame in raw.chunks_exact(frame_bytes) {
        for (c, sample) in frame.chunks_exact(PCM16_BYTES_PER_SAMPLE).enumerate() {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            channel_data[c].push(value as f32 / PCM16_SCALE);
        }
    }

    DecodedAudioBuffer::from_channels(sample_rate, channel_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::decode_base64;

    fn to_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_boundary_samples() {
        let buffer = decode_pcm16(&[0x00, 0x80, 0xFF, 0x7F], 24000, 1).unwrap();

        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.num_channels(), 1);
        assert_eq!(buffer.sample_rate(), 24000);

        let data = buffer.channel(0).unwrap();
        assert_eq!(data[0], -1.0);
        assert_eq!(data[1], 32767.0 / 32768.0);
        assert!(data[1] < 1.0);
        assert!((data[1] - 0.999_969).abs() < 1e-6);
    }

    #[test]
    fn test_zero_maps_to_zero() {
        let buffer = decode_pcm16(&[0x00, 0x00], 24000, 1).unwrap();
        assert_eq!(buffer.channel(0).unwrap(), &[0.0]);
    }

    #[test]
    fn test_stereo_deinterleave() {
        // [L0, R0, L1, R1]
        let raw = to_bytes(&[100, -200, 300, -400]);
        let buffer = decode_pcm16(&raw, 44100, 2).unwrap();

        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(
            buffer.channel(0).unwrap(),
            &[100.0 / 32768.0, 300.0 / 32768.0]
        );
        assert_eq!(
            buffer.channel(1).unwrap(),
            &[-200.0 / 32768.0, -400.0 / 32768.0]
        );
    }

    #[test]
    fn test_odd_length_rejected_for_mono() {
        let result = decode_pcm16(&[0x00, 0x80, 0xFF], 24000, 1);
        assert_eq!(
            result,
            Err(AudioError::MalformedAudio {
                len: 3,
                frame_bytes: 2
            })
        );
    }

    #[test]
    fn test_partial_frame_rejected_for_stereo() {
        let raw = to_bytes(&[1, 2, 3]);
        assert!(matches!(
            decode_pcm16(&raw, 24000, 2),
            Err(AudioError::MalformedAudio { len: 6, frame_bytes: 4 })
        ));
    }

    #[test]
    fn test_empty_input_yields_empty_buffer() {
        let buffer = decode_pcm16(&[], 24000, 1).unwrap();
        assert_eq!(buffer.frame_count(), 0);
        assert_eq!(buffer.channel(0).unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(decode_pcm16(&[0, 0], 0, 1), Err(AudioError::InvalidFormat(_))));
        assert!(matches!(decode_pcm16(&[0, 0], 24000, 0), Err(AudioError::InvalidFormat(_))));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let raw: Vec<u8> = (0..2000u32).map(|i| (i * 7 % 256) as u8).collect();
        let first = decode_pcm16(&raw, 24000, 2).unwrap();
        let second = decode_pcm16(&raw, 24000, 2).unwrap();

        for (a, b) in first.channels().iter().zip(second.channels()) {
            let a_bits: Vec<u32> = a.iter().map(|s| s.to_bits()).collect();
            let b_bits: Vec<u32> = b.iter().map(|s| s.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
    }

    #[test]
    fn test_samples_stay_in_range() {
        let raw = to_bytes(&[i16::MIN, -1, 0, 1, i16::MAX]);
        let buffer = decode_pcm16(&raw, 24000, 1).unwrap();
        assert!(buffer
            .channel(0)
            .unwrap()
            .iter()
            .all(|s| (-1.0..1.0).contains(s)));
    }

    #[test]
    fn test_base64_payload_end_to_end() {
        let raw = decode_base64("AID/fw==").unwrap();
        let buffer = decode_pcm16(&raw, 24000, 1).unwrap();
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(0).unwrap()[0], -1.0);
    }

    #[test]
    fn test_wav_export_preserves_pcm_bytes() {
        let raw = to_bytes(&[i16::MIN, -12345, 0, 42, i16::MAX, 7]);
        let buffer = decode_pcm16(&raw, 24000, 2).unwrap();
        let wav = buffer.to_wav();
        assert_eq!(&wav[44..], raw.as_slice());
    }
}
