//! Credential Store Port - API Key 保管
//!
//! 只保存在内存中，不落盘

use crate::domain::ApiKey;

pub trait CredentialStorePort: Send + Sync {
    /// 设置（覆盖）当前 API Key
    fn set(&self, key: ApiKey);

    /// 获取当前 API Key
    fn get(&self) -> Option<ApiKey>;

    fn is_configured(&self) -> bool {
        self.get().is_some()
    }
}
