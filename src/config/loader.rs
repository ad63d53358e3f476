//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 未配置 `model.api_key` 时读取的环境变量
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `GHOSTWRITER_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `GHOSTWRITER_SERVER__PORT=8080`
/// - `GHOSTWRITER_MODEL__VOICE_NAME=Puck`
/// - `GHOSTWRITER_AUDIO__OUTPUT=silent`
/// - `GEMINI_API_KEY=AIza...`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5060)?
        .set_default("server.body_limit", 8_u64 * 1024 * 1024)?
        .set_default("model.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("model.analysis_model", "gemini-2.0-flash")?
        .set_default("model.speech_model", "gemini-2.5-flash-preview-tts")?
        .set_default("model.chat_model", "gemini-2.0-flash")?
        .set_default("model.voice_name", "Kore")?
        .set_default("model.timeout_secs", 120)?
        .set_default("model.fake", false)?
        .set_default("story.max_image_bytes", 5_u64 * 1024 * 1024)?
        .set_default("chat.replay_history", true)?
        .set_default("audio.output", "cpal")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: GHOSTWRITER_MODEL__BASE_URL=http://localhost:9000
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("GHOSTWRITER")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    if app_config.model.api_key.is_none() {
        app_config.model.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
    }

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.model.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Model base URL cannot be empty".to_string(),
        ));
    }

    if config.model.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Model timeout cannot be 0".to_string(),
        ));
    }

    for (name, value) in [
        ("analysis_model", &config.model.analysis_model),
        ("speech_model", &config.model.speech_model),
        ("chat_model", &config.model.chat_model),
        ("voice_name", &config.model.voice_name),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "model.{} cannot be empty",
                name
            )));
        }
    }

    if config.story.max_image_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Max image size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    if config.model.fake {
        tracing::info!("Model: fake (offline)");
    } else {
        tracing::info!("Model URL: {}", config.model.base_url);
        tracing::info!(
            "Models: analysis={}, speech={}, chat={}",
            config.model.analysis_model,
            config.model.speech_model,
            config.model.chat_model
        );
        tracing::info!("Model Timeout: {}s", config.model.timeout_secs);
    }
    tracing::info!("Voice: {}", config.model.voice_name);
    tracing::info!("API Key Configured: {}", config.model.api_key.is_some());
    tracing::info!("Max Image Size: {} bytes", config.story.max_image_bytes);
    tracing::info!("Chat History Replay: {}", config.chat.replay_history);
    tracing::info!("Audio Output: {:?}", config.audio.output);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioOutputKind;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_base_url() {
        let mut config = AppConfig::default();
        config.model.base_url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_timeout() {
        let mut config = AppConfig::default();
        config.model.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_blank_model_name() {
        let mut config = AppConfig::default();
        config.model.speech_model = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("speech_model"));
    }

    #[test]
    fn test_validation_error_for_zero_image_limit() {
        let mut config = AppConfig::default();
        config.story.max_image_bytes = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[model]
voice_name = "Puck"

[chat]
replay_history = false

[audio]
output = "silent"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.voice_name, "Puck");
        assert_eq!(config.model.analysis_model, "gemini-2.0-flash");
        assert!(!config.chat.replay_history);
        assert_eq!(config.audio.output, AudioOutputKind::Silent);
    }

    #[test]
    fn test_missing_required_file_fails() {
        let result = load_config_from_path(Some(Path::new("/nonexistent/ghostwriter.toml")));
        assert!(result.is_err());
    }
}
