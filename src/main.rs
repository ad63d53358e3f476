//! Ghostwriter - 看图写故事助手
//!
//! - Domain: audio/, story/
//! - Application: commands, queries, ports, playback
//! - Infrastructure: http, memory, adapters, audio, events

use std::sync::Arc;

use ghostwriter::application::{
    AudioOutputPort, CredentialStorePort, GenerativeModelPort, SpeechEnginePort,
};
use ghostwriter::config::{load_config, print_config, AppConfig, AudioOutputKind};
use ghostwriter::domain::ApiKey;
use ghostwriter::infrastructure::adapters::{
    FakeModelClient, FakeModelClientConfig, GeminiClient, GeminiClientConfig,
};
use ghostwriter::infrastructure::audio::{CpalAudioOutput, SilentAudioOutput};
use ghostwriter::infrastructure::events::EventPublisher;
use ghostwriter::infrastructure::http::{AppState, HttpServer, StoryOptions};
use ghostwriter::infrastructure::memory::{InMemoryCredentialStore, InMemoryStorySession};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},ghostwriter={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 创建模型客户端（分析/对话 + 语音合成）
fn build_model(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn GenerativeModelPort>, Arc<dyn SpeechEnginePort>)> {
    if config.model.fake {
        let client = Arc::new(FakeModelClient::new(FakeModelClientConfig {
            voice_name: config.model.voice_name.clone(),
            latency_ms: 300,
            ..Default::default()
        }));
        return Ok((client.clone(), client));
    }

    let client = Arc::new(GeminiClient::new(GeminiClientConfig {
        base_url: config.model.base_url.clone(),
        analysis_model: config.model.analysis_model.clone(),
        speech_model: config.model.speech_model.clone(),
        chat_model: config.model.chat_model.clone(),
        voice_name: config.model.voice_name.clone(),
        timeout_secs: config.model.timeout_secs,
    })?);
    Ok((client.clone(), client))
}

fn build_audio_output(config: &AppConfig) -> Arc<dyn AudioOutputPort> {
    match config.audio.output {
        AudioOutputKind::Cpal => Arc::new(CpalAudioOutput::new()),
        AudioOutputKind::Silent => Arc::new(SilentAudioOutput::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Ghostwriter - 看图写故事助手");
    print_config(&config);

    // API Key 只保存在内存中
    let credentials = Arc::new(InMemoryCredentialStore::new());
    if let Some(key) = config.model.api_key.as_deref() {
        match ApiKey::new(key) {
            Ok(key) => credentials.set(key),
            Err(e) => tracing::warn!(error = %e, "Ignoring configured API key"),
        }
    }

    let (model, speech) = build_model(&config)?;
    let audio_output = build_audio_output(&config);
    tracing::info!(backend = audio_output.name(), "Audio output selected");

    let session = Arc::new(InMemoryStorySession::new(audio_output));
    let event_publisher = Arc::new(EventPublisher::new());

    let state = AppState::new(
        session,
        credentials,
        model,
        speech,
        event_publisher,
        StoryOptions {
            max_image_bytes: config.story.max_image_bytes,
            replay_history: config.chat.replay_history,
        },
    );

    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
