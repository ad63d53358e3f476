//! Credential Commands - API Key 相关命令

/// 设置 API Key 命令
#[derive(Clone)]
pub struct SetApiKeyCommand {
    pub api_key: String,
}
