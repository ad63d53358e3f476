//! Chat Command Handlers

use std::sync::Arc;

use crate::application::commands::{SendChatMessageCommand, SendChatMessageResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChatRequest, CredentialStorePort, GenerativeModelPort, StorySessionPort,
};
use crate::domain::story::{ChatMessage, StoryContext, StoryError, CHAT_FAILED_REPLY};

/// 对话系统指令
pub fn chat_system_instruction(story: &StoryContext) -> String {
    format!(
        "You are an expert ghostwriter and world-builder. Use the following story context to answer the user's questions or help them expand their story: {}",
        story.chat_context()
    )
}

/// 对话通道占用，离开作用域时释放
struct ChatGuard<'a> {
    session: &'a dyn StorySessionPort,
}

impl Drop for ChatGuard<'_> {
    fn drop(&mut self) {
        self.session.end_chat();
    }
}

/// SendChatMessage Handler - 围绕当前故事的多轮对话
pub struct SendChatMessageHandler {
    session: Arc<dyn StorySessionPort>,
    model: Arc<dyn GenerativeModelPort>,
    credentials: Arc<dyn CredentialStorePort>,
    replay_history: bool,
}

impl SendChatMessageHandler {
    pub fn new(
        session: Arc<dyn StorySessionPort>,
        model: Arc<dyn GenerativeModelPort>,
        credentials: Arc<dyn CredentialStorePort>,
        replay_history: bool,
    ) -> Self {
        Self {
            session,
            model,
            credentials,
            replay_history,
        }
    }

    pub async fn handle(
        &self,
        command: SendChatMessageCommand,
    ) -> Result<SendChatMessageResponse, ApplicationError> {
        let user_message = ChatMessage::user(command.message)?;

        let (story_id, story) = self
            .session
            .current_story()
            .filter(|(_, story)| story.has_paragraph())
            .ok_or(StoryError::NoStory)?;
        let api_key = self
            .credentials
            .get()
            .ok_or(ApplicationError::MissingCredentials)?;

        if !self.session.try_begin_chat() {
            return Err(ApplicationError::invalid_state(
                "a chat message is already in flight",
            ));
        }
        let _guard = ChatGuard {
            session: self.session.as_ref(),
        };

        let history = if self.replay_history {
            self.session.transcript()
        } else {
            Vec::new()
        };
        let request = ChatRequest {
            system_instruction: chat_system_instruction(&story),
            history,
            message: user_message.content.clone(),
        };
        self.session.append_message(story_id, user_message)?;

        tracing::debug!(
            story_id = %story_id,
            history_len = request.history.len(),
            "Sending chat message"
        );

        let (reply, degraded) = match self.model.chat(request, &api_key).await {
            Ok(reply) => (reply, false),
            Err(e) => {
                tracing::error!(story_id = %story_id, error = %e, "Chat request failed");
                (CHAT_FAILED_REPLY.to_string(), true)
            }
        };

        if let Err(e) = self
            .session
            .append_message(story_id, ChatMessage::model(reply.clone()))
        {
            tracing::debug!(story_id = %story_id, error = %e, "Story changed during chat, reply not recorded");
        }

        Ok(SendChatMessageResponse { reply, degraded })
    }
}
