//! HTTP Server
//!
//! 监听地址、请求体上限取自 `[server]` 配置；关闭信号到达后等待进行中的请求结束

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::CONTENT_TYPE;
use http::Method;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 路由 + 中间件
    ///
    /// 图片以 base64 放在 JSON 请求体中，`body_limit` 需覆盖膨胀后的图片上限
    pub fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
            .max_age(Duration::from_secs(3600));

        create_routes()
            .layer(DefaultBodyLimit::max(self.config.body_limit))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 绑定配置中的监听地址
    pub async fn bind(&self) -> Result<TcpListener, std::io::Error> {
        TcpListener::bind(self.config.addr()).await
    }

    /// 在已绑定的监听器上提供服务，`shutdown_signal` 完成后优雅退出
    pub async fn serve<F>(self, listener: TcpListener, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: Option<SocketAddr> = listener.local_addr().ok();
        tracing::info!(
            addr = ?local_addr,
            body_limit = self.config.body_limit,
            "Ghostwriter HTTP server listening"
        );

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal)
            .await
    }

    /// 绑定并运行直到收到关闭信号
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeModelClient;
    use crate::infrastructure::audio::SilentAudioOutput;
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::http::state::StoryOptions;
    use crate::infrastructure::memory::{InMemoryCredentialStore, InMemoryStorySession};

    fn server() -> HttpServer {
        let model = Arc::new(FakeModelClient::with_defaults());
        let state = AppState::new(
            Arc::new(InMemoryStorySession::new(Arc::new(SilentAudioOutput::new()))),
            Arc::new(InMemoryCredentialStore::new()),
            model.clone(),
            model,
            Arc::new(EventPublisher::new()),
            StoryOptions::default(),
        );
        HttpServer::new(
            ServerConfig {
                port: 0,
                ..ServerConfig::default()
            },
            state,
        )
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let server = server();
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let running = tokio::spawn(server.serve(listener, async {
            let _ = stop_rx.await;
        }));

        let body: serde_json::Value = reqwest::get(format!("http://{}/api/ping", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");

        stop_tx.send(()).unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_json_posts() {
        let response = tower::util::ServiceExt::oneshot(
            server().build_router(),
            http::Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/story/analyze")
                .header(http::header::ORIGIN, "http://localhost:5173")
                .header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(http::header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[http::header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
