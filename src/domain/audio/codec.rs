//! Base64 编解码
//!
//! 标准字母表 + padding，与 Gemini inlineData 的传输编码一致

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::AudioError;

/// 解码 base64 文本为原始字节
///
/// 首尾空白会被忽略；非法字符或 padding 错误返回 `AudioError::Decoding`
pub fn decode_base64(input: &str) -> Result<Vec<u8>, AudioError> {
    STANDARD
        .decode(input.trim())
        .map_err(|e| AudioError::Decoding(e.to_string()))
}

/// 编码原始字节为 base64 文本
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_empty() {
        assert_eq!(encode_base64(&[]), "");
        assert_eq!(decode_base64("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_round_trip_all_byte_values() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096 + 3).collect();
        let encoded = encode_base64(&bytes);
        assert_eq!(decode_base64(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_round_trip_large_payload() {
        // ~10 秒 24kHz 单声道 PCM
        let bytes: Vec<u8> = (0..480_000u32).map(|i| (i * 31 % 251) as u8).collect();
        assert_eq!(decode_base64(&encode_base64(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_decode_known_value() {
        assert_eq!(decode_base64("AID/fw==").unwrap(), vec![0x00, 0x80, 0xFF, 0x7F]);
    }

    #[test]
    fn test_decode_ignores_surrounding_whitespace() {
        assert_eq!(decode_base64("  AID/fw==\n").unwrap(), vec![0x00, 0x80, 0xFF, 0x7F]);
    }

    #[test]
    fn test_invalid_character_rejected() {
        assert!(matches!(decode_base64("AI*/fw=="), Err(AudioError::Decoding(_))));
    }

    #[test]
    fn test_bad_padding_rejected() {
        assert!(matches!(decode_base64("AID/fw="), Err(AudioError::Decoding(_))));
        assert!(matches!(decode_base64("A"), Err(AudioError::Decoding(_))));
    }
}
