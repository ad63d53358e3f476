//! Story Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StoryError;
use crate::domain::audio::decode_base64;

/// 故事展示的唯一标识
///
/// 每次分析成功都会生成新的 StoryId，朗读缓存按它隔离
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryId(Uuid);

impl StoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 图片分析得到的故事语义
///
/// 分析产生后不可变；作为朗读和对话的只读输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryContext {
    mood: String,
    setting: String,
    key_details: Vec<String>,
    paragraph: String,
}

impl StoryContext {
    pub fn new(
        mood: impl Into<String>,
        setting: impl Into<String>,
        key_details: Vec<String>,
        paragraph: impl Into<String>,
    ) -> Self {
        Self {
            mood: mood.into(),
            setting: setting.into(),
            key_details,
            paragraph: paragraph.into(),
        }
    }

    pub fn mood(&self) -> &str {
        &self.mood
    }

    pub fn setting(&self) -> &str {
        &self.setting
    }

    pub fn key_details(&self) -> &[String] {
        &self.key_details
    }

    pub fn paragraph(&self) -> &str {
        &self.paragraph
    }

    /// 开篇段落是否可用（朗读与对话的前提）
    pub fn has_paragraph(&self) -> bool {
        !self.paragraph.trim().is_empty()
    }

    /// 对话用的上下文摘要
    pub fn chat_context(&self) -> String {
        format!(
            "Mood: {}, Setting: {}, Story: {}",
            self.mood, self.setting, self.paragraph
        )
    }
}

/// 未声明 MIME 类型时使用的默认值
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// 上传的图片
///
/// 接受 data URL (`data:image/png;base64,...`) 或裸 base64
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    mime_type: String,
    data: String,
    byte_len: usize,
}

impl ImageUpload {
    /// 解析并校验上传内容
    pub fn parse(input: &str, max_bytes: usize) -> Result<Self, StoryError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(StoryError::InvalidImage("image data is empty".to_string()));
        }

        let (mime_type, data) = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    StoryError::InvalidImage("malformed data URL".to_string())
                })?;
                let mut params = header.split(';');
                let mime = params.next().unwrap_or_default().trim().to_lowercase();
                if !params.any(|p| p.trim() == "base64") {
                    return Err(StoryError::InvalidImage(
                        "data URL must be base64 encoded".to_string(),
                    ));
                }
                (mime, payload)
            }
            None => (DEFAULT_IMAGE_MIME.to_string(), input),
        };

        if !mime_type.starts_with("image/") {
            return Err(StoryError::InvalidImage(format!(
                "unsupported content type: {}",
                mime_type
            )));
        }

        let byte_len = decode_base64(data)
            .map_err(|e| StoryError::InvalidImage(e.to_string()))?
            .len();
        if byte_len == 0 {
            return Err(StoryError::InvalidImage("image data is empty".to_string()));
        }
        if byte_len > max_bytes {
            return Err(StoryError::ImageTooLarge {
                size: byte_len,
                limit: max_bytes,
            });
        }

        Ok(Self {
            mime_type,
            data: data.trim().to_string(),
            byte_len,
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// base64 编码的图片数据（不含 data URL 头）
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 5 * 1024 * 1024;

    #[test]
    fn test_parse_data_url() {
        let image = ImageUpload::parse("data:image/png;base64,iVBORw0KGgo=", LIMIT).unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.data(), "iVBORw0KGgo=");
        assert_eq!(image.byte_len(), 8);
        assert_eq!(image.data_url(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_parse_bare_base64_defaults_to_jpeg() {
        let image = ImageUpload::parse("/9j/4AAQ", LIMIT).unwrap();
        assert_eq!(image.mime_type(), DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn test_rejects_non_image() {
        let result = ImageUpload::parse("data:text/plain;base64,aGVsbG8=", LIMIT);
        assert!(matches!(result, Err(StoryError::InvalidImage(_))));
    }

    #[test]
    fn test_rejects_non_base64_data_url() {
        let result = ImageUpload::parse("data:image/svg+xml,<svg/>", LIMIT);
        assert!(matches!(result, Err(StoryError::InvalidImage(_))));
    }

    #[test]
    fn test_rejects_oversized() {
        let result = ImageUpload::parse("data:image/png;base64,AAAAAAAA", 4);
        assert_eq!(result, Err(StoryError::ImageTooLarge { size: 6, limit: 4 }));
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert!(ImageUpload::parse("   ", LIMIT).is_err());
        assert!(ImageUpload::parse("data:image/png;base64,", LIMIT).is_err());
        assert!(ImageUpload::parse("not base64!", LIMIT).is_err());
    }

    #[test]
    fn test_chat_context_format() {
        let story = StoryContext::new("eerie", "a lighthouse", vec![], "The lamp went dark.");
        assert_eq!(
            story.chat_context(),
            "Mood: eerie, Setting: a lighthouse, Story: The lamp went dark."
        );
    }

    #[test]
    fn test_has_paragraph() {
        assert!(!StoryContext::new("", "", vec![], "  ").has_paragraph());
        assert!(StoryContext::new("", "", vec![], "Once.").has_paragraph());
    }
}
