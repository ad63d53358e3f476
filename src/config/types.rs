//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 远程模型配置
    #[serde(default)]
    pub model: ModelConfig,

    /// 故事工作流配置
    #[serde(default)]
    pub story: StoryConfig,

    /// 对话配置
    #[serde(default)]
    pub chat: ChatConfig,

    /// 音频输出配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体大小上限（字节）
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5060
}

fn default_body_limit() -> usize {
    8 * 1024 * 1024 // base64 膨胀后的 5MB 图片
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit: default_body_limit(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 远程模型配置
#[derive(Clone, Deserialize)]
pub struct ModelConfig {
    /// Gemini API 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 启动时使用的 API Key；未设置时读取 `GEMINI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// 图片分析模型
    #[serde(default = "default_text_model")]
    pub analysis_model: String,

    /// 语音合成模型
    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    /// 对话模型
    #[serde(default = "default_text_model")]
    pub chat_model: String,

    /// 朗读音色
    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// 使用不访问网络的假模型（开发用）
    #[serde(default)]
    pub fake: bool,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_text_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_speech_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_voice_name() -> String {
    "Kore".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            analysis_model: default_text_model(),
            speech_model: default_speech_model(),
            chat_model: default_text_model(),
            voice_name: default_voice_name(),
            timeout_secs: default_timeout(),
            fake: false,
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "****"))
            .field("analysis_model", &self.analysis_model)
            .field("speech_model", &self.speech_model)
            .field("chat_model", &self.chat_model)
            .field("voice_name", &self.voice_name)
            .field("timeout_secs", &self.timeout_secs)
            .field("fake", &self.fake)
            .finish()
    }
}

/// 故事工作流配置
#[derive(Debug, Clone, Deserialize)]
pub struct StoryConfig {
    /// 上传图片解码后的最大字节数
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

fn default_max_image_bytes() -> usize {
    5 * 1024 * 1024 // 5 MB
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

/// 对话配置
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// 每次请求是否回放之前的对话轮次
    /// false 时每条消息独立发送
    #[serde(default = "default_replay_history")]
    pub replay_history: bool,
}

fn default_replay_history() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            replay_history: default_replay_history(),
        }
    }
}

/// 音频输出后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioOutputKind {
    /// 默认声卡
    #[default]
    Cpal,
    /// 不出声，按时长模拟播放
    Silent,
}

/// 音频输出配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub output: AudioOutputKind,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
