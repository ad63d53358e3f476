//! HTTP Handlers

mod chat;
mod credentials;
mod ping;
mod story;
mod websocket;

pub use chat::*;
pub use credentials::*;
pub use ping::*;
pub use story::*;
pub use websocket::*;
