//! In-Memory Story Session Implementation

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::application::playback::PlaybackController;
use crate::application::ports::{AudioOutputPort, StorySessionPort};
use crate::domain::story::{
    AnalysisTicket, ChatMessage, ChatTranscript, ImageUpload, StoryContext, StoryError, StoryId,
    StoryWorkflow, WorkflowState,
};

struct SessionInner {
    workflow: StoryWorkflow,
    transcript: ChatTranscript,
    playback: Option<Arc<PlaybackController>>,
}

impl SessionInner {
    /// 丢弃当前故事附带的对话和播放控制器
    fn discard_story(&mut self) -> Option<Arc<PlaybackController>> {
        self.transcript.clear();
        self.playback.take()
    }
}

/// 内存故事会话
///
/// 单用户单会话；工作流、对话记录和播放控制器放在同一把锁下，保证三者一致
pub struct InMemoryStorySession {
    inner: Mutex<SessionInner>,
    chat_in_flight: AtomicBool,
    audio_output: Arc<dyn AudioOutputPort>,
}

impl InMemoryStorySession {
    pub fn new(audio_output: Arc<dyn AudioOutputPort>) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                workflow: StoryWorkflow::new(),
                transcript: ChatTranscript::new(),
                playback: None,
            }),
            chat_in_flight: AtomicBool::new(false),
            audio_output,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn release(playback: Option<Arc<PlaybackController>>) {
        if let Some(playback) = playback {
            playback.release();
        }
    }
}

impl StorySessionPort for InMemoryStorySession {
    fn state(&self) -> WorkflowState {
        self.inner.lock().workflow.state().clone()
    }

    fn begin_analysis(&self, image: Arc<ImageUpload>) -> Result<AnalysisTicket, StoryError> {
        let released = {
            let mut inner = self.inner.lock();
            let ticket = inner.workflow.begin_analysis(image)?;
            tracing::debug!(ticket = ticket.value(), "Workflow entered loading state");
            (ticket, inner.discard_story())
        };
        Self::release(released.1);
        Ok(released.0)
    }

    fn complete_analysis(
        &self,
        ticket: AnalysisTicket,
        story: StoryContext,
    ) -> Result<StoryId, StoryError> {
        let mut inner = self.inner.lock();
        let story_id = inner.workflow.complete_analysis(ticket, story)?;
        inner.playback = Some(Arc::new(PlaybackController::new(
            story_id,
            self.audio_output.clone(),
        )));
        tracing::debug!(story_id = %story_id, "Workflow entered displaying state");
        Ok(story_id)
    }

    fn fail_analysis(&self, ticket: AnalysisTicket, message: &str) -> Result<(), StoryError> {
        self.inner.lock().workflow.fail_analysis(ticket, message)
    }

    fn reset(&self) {
        let released = {
            let mut inner = self.inner.lock();
            inner.workflow.reset();
            inner.discard_story()
        };
        Self::release(released);
    }

    fn current_story(&self) -> Option<(StoryId, StoryContext)> {
        self.inner
            .lock()
            .workflow
            .displayed()
            .map(|(id, story)| (id, story.clone()))
    }

    fn playback(&self) -> Option<Arc<PlaybackController>> {
        self.inner.lock().playback.clone()
    }

    fn transcript(&self) -> Vec<ChatMessage> {
        self.inner.lock().transcript.messages().to_vec()
    }

    fn append_message(&self, story_id: StoryId, message: ChatMessage) -> Result<(), StoryError> {
        let mut inner = self.inner.lock();
        match inner.workflow.displayed() {
            Some((current, _)) if current == story_id => {
                inner.transcript.push(message);
                Ok(())
            }
            _ => Err(StoryError::NoStory),
        }
    }

    fn try_begin_chat(&self) -> bool {
        self.chat_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn end_chat(&self) {
        self.chat_in_flight.store(false, Ordering::SeqCst);
    }
}
