//! Chat Commands - 对话相关命令

/// 发送对话消息命令
#[derive(Debug, Clone)]
pub struct SendChatMessageCommand {
    pub message: String,
}

/// 发送对话消息响应
#[derive(Debug, Clone)]
pub struct SendChatMessageResponse {
    /// 模型回复；请求失败时为致歉文本
    pub reply: String,
    /// 远程请求是否失败（回复为致歉文本）
    pub degraded: bool,
}
