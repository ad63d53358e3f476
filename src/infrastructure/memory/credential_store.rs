//! In-Memory Credential Store Implementation

use parking_lot::RwLock;
use std::sync::Arc;

use crate::application::ports::CredentialStorePort;
use crate::domain::ApiKey;

/// 内存 API Key 存储
pub struct InMemoryCredentialStore {
    key: RwLock<Option<ApiKey>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            key: RwLock::new(None),
        }
    }

    pub fn with_key(key: ApiKey) -> Self {
        Self {
            key: RwLock::new(Some(key)),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStorePort for InMemoryCredentialStore {
    fn set(&self, key: ApiKey) {
        *self.key.write() = Some(key);
    }

    fn get(&self) -> Option<ApiKey> {
        self.key.read().clone()
    }
}
