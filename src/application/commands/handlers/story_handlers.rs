//! Story Command Handlers

use std::sync::Arc;

use crate::application::commands::{
    AnalyzeImageCommand, AnalyzeImageResponse, NarrateStoryCommand, NarrationOutcome,
    ResetStoryCommand,
};
use crate::application::error::ApplicationError;
use crate::application::playback::narration_cache_key;
use crate::application::ports::{
    CredentialStorePort, GenerativeModelPort, ModelError, SpeechEnginePort, StorySessionPort,
};
use crate::domain::story::{
    AnalysisTicket, ImageUpload, StoryContext, StoryError, ANALYSIS_FAILED_MESSAGE,
};
use crate::infrastructure::events::EventPublisher;

// ============================================================================
// AnalyzeImage
// ============================================================================

/// AnalyzeImage Handler - 上传图片并生成故事开篇
pub struct AnalyzeImageHandler {
    session: Arc<dyn StorySessionPort>,
    model: Arc<dyn GenerativeModelPort>,
    credentials: Arc<dyn CredentialStorePort>,
    event_publisher: Arc<EventPublisher>,
    max_image_bytes: usize,
}

impl AnalyzeImageHandler {
    pub fn new(
        session: Arc<dyn StorySessionPort>,
        model: Arc<dyn GenerativeModelPort>,
        credentials: Arc<dyn CredentialStorePort>,
        event_publisher: Arc<EventPublisher>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            session,
            model,
            credentials,
            event_publisher,
            max_image_bytes,
        }
    }

    pub async fn handle(
        &self,
        command: AnalyzeImageCommand,
    ) -> Result<AnalyzeImageResponse, ApplicationError> {
        let api_key = self
            .credentials
            .get()
            .ok_or(ApplicationError::MissingCredentials)?;
        let image = Arc::new(ImageUpload::parse(&command.image, self.max_image_bytes)?);
        let ticket = self.session.begin_analysis(image.clone())?;

        tracing::info!(
            ticket = ticket.value(),
            mime_type = %image.mime_type(),
            image_bytes = image.byte_len(),
            "Image analysis started"
        );
        self.event_publisher.publish_analysis_started();

        // 请求方断开时 handler future 会被丢弃，分析在独立任务中完成并落地结果
        let session = self.session.clone();
        let model = self.model.clone();
        let event_publisher = self.event_publisher.clone();
        let analysis = tokio::spawn(async move {
            let result = model.analyze_image(&image, &api_key).await;
            settle_analysis(session.as_ref(), &event_publisher, ticket, result)
        });

        analysis.await.map_err(|e| {
            tracing::error!(ticket = ticket.value(), error = %e, "Image analysis task aborted");
            ApplicationError::internal(format!("analysis task failed: {}", e))
        })??;

        Ok(AnalyzeImageResponse {
            state: self.session.state(),
        })
    }
}

/// 将模型结果写回工作流；票据过期（期间已重置或重新上传）的结果被丢弃
fn settle_analysis(
    session: &dyn StorySessionPort,
    event_publisher: &EventPublisher,
    ticket: AnalysisTicket,
    result: Result<StoryContext, ModelError>,
) -> Result<(), StoryError> {
    match result {
        Ok(story) => match session.complete_analysis(ticket, story) {
            Ok(story_id) => {
                tracing::info!(story_id = %story_id, "Image analysis completed");
                event_publisher.publish_analysis_completed(story_id);
            }
            Err(StoryError::StaleAnalysis(_)) => {
                tracing::info!(ticket = ticket.value(), "Workflow moved on, discarding analysis result");
            }
            Err(e) => return Err(e),
        },
        Err(e) => {
            tracing::error!(ticket = ticket.value(), error = %e, "Image analysis failed");
            match session.fail_analysis(ticket, ANALYSIS_FAILED_MESSAGE) {
                Ok(()) => event_publisher.publish_analysis_failed(ANALYSIS_FAILED_MESSAGE),
                Err(StoryError::StaleAnalysis(_)) => {
                    tracing::info!(ticket = ticket.value(), "Workflow moved on, discarding analysis failure");
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}

// ============================================================================
// ResetStory
// ============================================================================

/// ResetStory Handler - 回到初始状态
pub struct ResetStoryHandler {
    session: Arc<dyn StorySessionPort>,
    event_publisher: Arc<EventPublisher>,
}

impl ResetStoryHandler {
    pub fn new(session: Arc<dyn StorySessionPort>, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            session,
            event_publisher,
        }
    }

    pub fn handle(&self, _command: ResetStoryCommand) {
        self.session.reset();
        self.event_publisher.publish_story_reset();
        tracing::info!("Story workflow reset");
    }
}

// ============================================================================
// NarrateStory
// ============================================================================

/// NarrateStory Handler - 朗读开篇段落
///
/// 流程：占用播放状态 → 命中缓存或合成并缓存 → 播放。
/// 播放状态在合成前占用，合成期间的重复请求被忽略；任何失败都会复位播放状态。
pub struct NarrateStoryHandler {
    session: Arc<dyn StorySessionPort>,
    speech: Arc<dyn SpeechEnginePort>,
    credentials: Arc<dyn CredentialStorePort>,
    event_publisher: Arc<EventPublisher>,
}

impl NarrateStoryHandler {
    pub fn new(
        session: Arc<dyn StorySessionPort>,
        speech: Arc<dyn SpeechEnginePort>,
        credentials: Arc<dyn CredentialStorePort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            session,
            speech,
            credentials,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        _command: NarrateStoryCommand,
    ) -> Result<NarrationOutcome, ApplicationError> {
        let (story_id, story) = match self.session.current_story() {
            Some(current) if current.1.has_paragraph() => current,
            _ => return Ok(NarrationOutcome::NothingToNarrate),
        };
        let Some(controller) = self.session.playback() else {
            return Ok(NarrationOutcome::NothingToNarrate);
        };
        let Some(claim) = controller.try_claim() else {
            tracing::debug!(story_id = %story_id, "Narration already playing");
            return Ok(NarrationOutcome::AlreadyPlaying);
        };

        let cache_key = narration_cache_key(story.paragraph(), self.speech.voice_name());
        let (buffer, cached) = match controller.cached_narration(&cache_key) {
            Some(buffer) => (buffer, true),
            None => {
                let api_key = self
                    .credentials
                    .get()
                    .ok_or(ApplicationError::MissingCredentials)?;

                match self.speech.synthesize(story.paragraph(), &api_key).await {
                    Ok(buffer) => {
                        let buffer = Arc::new(buffer);
                        controller.cache_narration(cache_key, buffer.clone());
                        (buffer, false)
                    }
                    Err(e) => {
                        tracing::error!(story_id = %story_id, error = %e, "Speech synthesis failed");
                        self.event_publisher
                            .publish_narration_failed(story_id, &e.to_string());
                        return Ok(NarrationOutcome::Failed {
                            error: e.to_string(),
                        });
                    }
                }
            }
        };

        // 合成期间故事可能已被重置或替换
        let still_current = self
            .session
            .playback()
            .is_some_and(|current| Arc::ptr_eq(&current, &controller));
        if !still_current {
            tracing::info!(story_id = %story_id, "Story changed during synthesis, discarding narration");
            return Ok(NarrationOutcome::Discarded);
        }

        let duration_ms = buffer.duration_ms();
        let publisher = self.event_publisher.clone();
        // 打开声卡和启动播放会阻塞等待播放线程应答
        let started = tokio::task::spawn_blocking(move || {
            controller.play_claimed(claim, buffer, move || {
                tracing::info!(story_id = %story_id, "Narration completed");
                publisher.publish_narration_completed(story_id);
            })
        })
        .await
        .map_err(|e| ApplicationError::internal(format!("playback task failed: {}", e)))?;

        match started {
            Ok(()) => {
                self.event_publisher
                    .publish_narration_started(story_id, duration_ms);
                Ok(NarrationOutcome::Started {
                    story_id,
                    duration_ms,
                    cached,
                })
            }
            Err(e) => {
                self.event_publisher
                    .publish_narration_failed(story_id, &e.to_string());
                Ok(NarrationOutcome::Failed {
                    error: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::playback::tests::ManualOutput;
    use crate::application::ports::{AudioContextPort, AudioOutputPort, PlaybackError};
    use crate::domain::story::{StoryContext, WorkflowState};
    use crate::domain::ApiKey;
    use crate::infrastructure::adapters::{FakeModelClient, FakeModelClientConfig};
    use crate::infrastructure::events::WsEvent;
    use crate::infrastructure::memory::{InMemoryCredentialStore, InMemoryStorySession};

    const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

    struct Fixture {
        session: Arc<InMemoryStorySession>,
        model: Arc<FakeModelClient>,
        output: Arc<ManualOutput>,
        credentials: Arc<InMemoryCredentialStore>,
        events: Arc<EventPublisher>,
    }

    impl Fixture {
        fn new() -> Self {
            let output = Arc::new(ManualOutput::new());
            let audio: Arc<dyn AudioOutputPort> = output.clone();
            let credentials = Arc::new(InMemoryCredentialStore::new());
            credentials.set(ApiKey::new("AIzaSyA-1234567890abcdefghij").unwrap());
            Self {
                session: Arc::new(InMemoryStorySession::new(audio)),
                model: Arc::new(FakeModelClient::new(FakeModelClientConfig::default())),
                output,
                credentials,
                events: Arc::new(EventPublisher::new()),
            }
        }

        fn analyze_handler(&self) -> AnalyzeImageHandler {
            AnalyzeImageHandler::new(
                self.session.clone(),
                self.model.clone(),
                self.credentials.clone(),
                self.events.clone(),
                1024,
            )
        }

        fn narrate_handler(&self) -> NarrateStoryHandler {
            NarrateStoryHandler::new(
                self.session.clone(),
                self.model.clone(),
                self.credentials.clone(),
                self.events.clone(),
            )
        }

        async fn analyze(&self) -> AnalyzeImageResponse {
            self.analyze_handler()
                .handle(AnalyzeImageCommand {
                    image: IMAGE.to_string(),
                })
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_analyze_displays_story() {
        let fx = Fixture::new();
        let mut events = fx.events.subscribe();

        let response = fx.analyze().await;
        match response.state {
            WorkflowState::Displaying { story, .. } => {
                assert_eq!(story, FakeModelClientConfig::default().story);
            }
            other => panic!("unexpected state: {:?}", other),
        }

        assert!(matches!(events.recv().await.unwrap(), WsEvent::AnalysisStarted));
        assert!(matches!(
            events.recv().await.unwrap(),
            WsEvent::AnalysisCompleted { .. }
        ));
    }

    #[tokio::test]
    async fn test_analyze_failure_shows_muse_message() {
        let fx = Fixture::new();
        fx.model.set_failing(true);

        let response = fx.analyze().await;
        match response.state {
            WorkflowState::Error { message, .. } => assert_eq!(message, ANALYSIS_FAILED_MESSAGE),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_requires_credentials() {
        let fx = Fixture::new();
        let handler = AnalyzeImageHandler::new(
            fx.session.clone(),
            fx.model.clone(),
            Arc::new(InMemoryCredentialStore::new()),
            fx.events.clone(),
            1024,
        );

        let result = handler
            .handle(AnalyzeImageCommand {
                image: IMAGE.to_string(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::MissingCredentials)));
        assert_eq!(fx.session.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn test_analyze_rejects_invalid_image() {
        let fx = Fixture::new();
        let result = fx
            .analyze_handler()
            .handle(AnalyzeImageCommand {
                image: "data:text/plain;base64,aGVsbG8=".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert_eq!(fx.model.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn test_narrate_synthesizes_once_and_caches() {
        let fx = Fixture::new();
        fx.analyze().await;
        let handler = fx.narrate_handler();

        let first = handler.handle(NarrateStoryCommand).await.unwrap();
        assert!(matches!(first, NarrationOutcome::Started { cached: false, .. }));
        assert!(fx.session.playback().unwrap().is_playing());

        let busy = handler.handle(NarrateStoryCommand).await.unwrap();
        assert_eq!(busy, NarrationOutcome::AlreadyPlaying);

        fx.output.context.finish();
        assert!(!fx.session.playback().unwrap().is_playing());

        let second = handler.handle(NarrateStoryCommand).await.unwrap();
        assert!(matches!(second, NarrationOutcome::Started { cached: true, .. }));
        assert_eq!(fx.model.synthesize_calls(), 1);
    }

    #[tokio::test]
    async fn test_narrate_publishes_completion() {
        let fx = Fixture::new();
        fx.analyze().await;
        let mut events = fx.events.subscribe();

        fx.narrate_handler().handle(NarrateStoryCommand).await.unwrap();
        fx.output.context.finish();

        assert!(matches!(
            events.recv().await.unwrap(),
            WsEvent::NarrationStarted { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            WsEvent::NarrationCompleted { .. }
        ));
    }

    #[tokio::test]
    async fn test_narrate_without_story() {
        let fx = Fixture::new();
        let outcome = fx.narrate_handler().handle(NarrateStoryCommand).await.unwrap();
        assert_eq!(outcome, NarrationOutcome::NothingToNarrate);
    }

    #[tokio::test]
    async fn test_narrate_with_empty_paragraph() {
        let fx = Fixture::new();
        let model = Arc::new(FakeModelClient::new(FakeModelClientConfig {
            story: StoryContext::new("", "", vec![], ""),
            ..Default::default()
        }));
        AnalyzeImageHandler::new(
            fx.session.clone(),
            model,
            fx.credentials.clone(),
            fx.events.clone(),
            1024,
        )
        .handle(AnalyzeImageCommand {
            image: IMAGE.to_string(),
        })
        .await
        .unwrap();

        let outcome = fx.narrate_handler().handle(NarrateStoryCommand).await.unwrap();
        assert_eq!(outcome, NarrationOutcome::NothingToNarrate);
    }

    #[tokio::test]
    async fn test_abandoned_analysis_still_settles() {
        let fx = Fixture::new();
        let model = Arc::new(FakeModelClient::new(FakeModelClientConfig {
            latency_ms: 200,
            ..Default::default()
        }));
        let handler = AnalyzeImageHandler::new(
            fx.session.clone(),
            model,
            fx.credentials.clone(),
            fx.events.clone(),
            1024,
        );

        let request = tokio::spawn(async move {
            handler
                .handle(AnalyzeImageCommand {
                    image: IMAGE.to_string(),
                })
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(matches!(fx.session.state(), WorkflowState::Loading { .. }));
        request.abort();

        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        assert!(matches!(fx.session.state(), WorkflowState::Displaying { .. }));

        let response = fx.analyze().await;
        assert!(matches!(response.state, WorkflowState::Displaying { .. }));
    }

    /// 打开上下文时阻塞的输出设备
    struct SlowOutput {
        inner: ManualOutput,
    }

    impl AudioOutputPort for SlowOutput {
        fn open_context(&self) -> Result<Arc<dyn AudioContextPort>, PlaybackError> {
            std::thread::sleep(std::time::Duration::from_millis(300));
            self.inner.open_context()
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_device_open_does_not_block_runtime() {
        let fx = Fixture::new();
        let session = Arc::new(InMemoryStorySession::new(Arc::new(SlowOutput {
            inner: ManualOutput::new(),
        })));
        AnalyzeImageHandler::new(
            session.clone(),
            fx.model.clone(),
            fx.credentials.clone(),
            fx.events.clone(),
            1024,
        )
        .handle(AnalyzeImageCommand {
            image: IMAGE.to_string(),
        })
        .await
        .unwrap();

        let handler = NarrateStoryHandler::new(
            session.clone(),
            fx.model.clone(),
            fx.credentials.clone(),
            fx.events.clone(),
        );
        let narration = tokio::spawn(async move { handler.handle(NarrateStoryCommand).await });

        let started = std::time::Instant::now();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(started.elapsed() < std::time::Duration::from_millis(250));
        assert!(!narration.is_finished());

        let outcome = narration.await.unwrap().unwrap();
        assert!(matches!(outcome, NarrationOutcome::Started { .. }));
    }

    #[tokio::test]
    async fn test_narrate_without_key_releases_claim() {
        let fx = Fixture::new();
        fx.analyze().await;

        let handler = NarrateStoryHandler::new(
            fx.session.clone(),
            fx.model.clone(),
            Arc::new(InMemoryCredentialStore::new()),
            fx.events.clone(),
        );
        let result = handler.handle(NarrateStoryCommand).await;
        assert!(matches!(result, Err(ApplicationError::MissingCredentials)));
        assert!(!fx.session.playback().unwrap().is_playing());
        assert_eq!(fx.model.synthesize_calls(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_resets_playing() {
        let fx = Fixture::new();
        fx.analyze().await;
        fx.model.set_failing(true);

        let outcome = fx.narrate_handler().handle(NarrateStoryCommand).await.unwrap();
        assert!(matches!(outcome, NarrationOutcome::Failed { .. }));
        assert!(!fx.session.playback().unwrap().is_playing());
    }

    #[tokio::test]
    async fn test_reset_discards_narration_cache() {
        let fx = Fixture::new();
        fx.analyze().await;
        fx.narrate_handler().handle(NarrateStoryCommand).await.unwrap();
        fx.output.context.finish();

        ResetStoryHandler::new(fx.session.clone(), fx.events.clone()).handle(ResetStoryCommand);
        assert!(fx.session.playback().is_none());

        fx.analyze().await;
        let outcome = fx.narrate_handler().handle(NarrateStoryCommand).await.unwrap();
        assert!(matches!(outcome, NarrationOutcome::Started { cached: false, .. }));
        assert_eq!(fx.model.synthesize_calls(), 2);
    }
}
