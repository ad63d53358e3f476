//! Gemini Adapter - 调用 Gemini REST `generateContent`
//!
//! 同时实现 GenerativeModelPort（图片分析、对话）和 SpeechEnginePort（语音合成）

mod client;
mod types;

pub use client::{GeminiClient, GeminiClientConfig};
