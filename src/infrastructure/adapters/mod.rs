//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod fake;
pub mod gemini;

pub use fake::*;
pub use gemini::*;
