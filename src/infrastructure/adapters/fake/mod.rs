//! Fake Adapter - 不访问网络的模型实现

mod fake_model_client;

pub use fake_model_client::{FakeModelClient, FakeModelClientConfig};
