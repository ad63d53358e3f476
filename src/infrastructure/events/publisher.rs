//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现：单用户单会话，所有事件走同一个广播通道

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::story::StoryId;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 开始分析图片
    AnalysisStarted,
    /// 分析完成，进入展示状态
    AnalysisCompleted { story_id: StoryId },
    /// 分析失败
    AnalysisFailed { message: String },
    /// 工作流重置
    StoryReset,
    /// 开始朗读
    NarrationStarted { story_id: StoryId, duration_ms: u64 },
    /// 朗读自然结束
    NarrationCompleted { story_id: StoryId },
    /// 朗读失败
    NarrationFailed { story_id: StoryId, error: String },
}

impl WsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WsEvent::AnalysisStarted => "AnalysisStarted",
            WsEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            WsEvent::AnalysisFailed { .. } => "AnalysisFailed",
            WsEvent::StoryReset => "StoryReset",
            WsEvent::NarrationStarted { .. } => "NarrationStarted",
            WsEvent::NarrationCompleted { .. } => "NarrationCompleted",
            WsEvent::NarrationFailed { .. } => "NarrationFailed",
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.channel.subscribe()
    }

    pub fn publish_analysis_started(&self) {
        self.publish(WsEvent::AnalysisStarted);
    }

    pub fn publish_analysis_completed(&self, story_id: StoryId) {
        self.publish(WsEvent::AnalysisCompleted { story_id });
    }

    pub fn publish_analysis_failed(&self, message: &str) {
        self.publish(WsEvent::AnalysisFailed {
            message: message.to_string(),
        });
    }

    pub fn publish_story_reset(&self) {
        self.publish(WsEvent::StoryReset);
    }

    pub fn publish_narration_started(&self, story_id: StoryId, duration_ms: u64) {
        self.publish(WsEvent::NarrationStarted {
            story_id,
            duration_ms,
        });
    }

    pub fn publish_narration_completed(&self, story_id: StoryId) {
        self.publish(WsEvent::NarrationCompleted { story_id });
    }

    pub fn publish_narration_failed(&self, story_id: StoryId, error: &str) {
        self.publish(WsEvent::NarrationFailed {
            story_id,
            error: error.to_string(),
        });
    }

    fn publish(&self, event: WsEvent) {
        let name = event.name();
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(
                event = name,
                error = %e,
                "Failed to publish event (no receivers)"
            );
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let publisher = EventPublisher::new();
        publisher.publish_story_reset();
    }

    #[tokio::test]
    async fn test_event_json_shape() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();
        let story_id = StoryId::new();

        publisher.publish_narration_started(story_id, 1500);
        let value = serde_json::to_value(rx.recv().await.unwrap()).unwrap();

        assert_eq!(value["event"], "NarrationStarted");
        assert_eq!(value["data"]["duration_ms"], 1500);
        assert_eq!(value["data"]["story_id"], story_id.to_string());
    }

    #[tokio::test]
    async fn test_unit_event_has_no_data() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish_analysis_started();
        let value = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
        assert_eq!(value["event"], "AnalysisStarted");
    }
}
