//! Credential Command Handlers

use std::sync::Arc;

use crate::application::commands::SetApiKeyCommand;
use crate::application::error::ApplicationError;
use crate::application::ports::CredentialStorePort;
use crate::domain::ApiKey;

/// SetApiKey Handler - 校验并保存 API Key
pub struct SetApiKeyHandler {
    credentials: Arc<dyn CredentialStorePort>,
}

impl SetApiKeyHandler {
    pub fn new(credentials: Arc<dyn CredentialStorePort>) -> Self {
        Self { credentials }
    }

    pub fn handle(&self, command: SetApiKeyCommand) -> Result<(), ApplicationError> {
        let key = ApiKey::new(command.api_key)?;
        self.credentials.set(key);
        tracing::info!("API key configured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryCredentialStore;

    #[test]
    fn test_set_valid_key() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let handler = SetApiKeyHandler::new(store.clone());

        handler
            .handle(SetApiKeyCommand {
                api_key: "AIzaSyA-1234567890abcdefghij".to_string(),
            })
            .unwrap();
        assert!(store.is_configured());
    }

    #[test]
    fn test_short_key_rejected_and_not_stored() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let handler = SetApiKeyHandler::new(store.clone());

        let result = handler.handle(SetApiKeyCommand {
            api_key: "short".to_string(),
        });
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert!(!store.is_configured());
    }
}
