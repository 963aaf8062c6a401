use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Instant;

use axum::{Router, middleware};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    tracing::info!(target: "http_access", "{} {} {} {}ms", method, uri, status, elapsed_ms);

    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .merge(crate::api::orders::router())
        .merge(crate::api::inventory::router())
}

/// Build the full application with state and middleware stack
pub fn build_router(state: ServerState) -> Router {
    build_app()
        // 认证中间件 - 在 Router 级别应用，require_auth 内部会跳过公共路由
        .layer(middleware::from_fn(require_auth))
        .with_state(state)
        // Tower HTTP 中间件
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        // HTTP 请求日志中间件
        .layer(middleware::from_fn(log_request))
}

#[derive(Clone, Debug)]
pub struct HttpService {
    state: ServerState,
    router: Router,
}

impl HttpService {
    pub fn new(state: ServerState) -> Self {
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Dispatch a single request without a listener
    pub async fn oneshot(
        &self,
        request: http::Request<axum::body::Body>,
    ) -> http::Response<axum::body::Body> {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    /// Bind `HTTP_PORT` and serve until `shutdown_signal` resolves
    ///
    /// In-flight requests get `SHUTDOWN_TIMEOUT_MS` to finish after the signal.
    pub async fn serve<F>(self, shutdown_signal: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("🚀 Starting HTTP server on {}", addr);

        let shutdown_timeout = self.state.config.shutdown_timeout();
        let signalled = CancellationToken::new();
        let trigger = signalled.clone();

        let server = axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown_signal.await;
                trigger.cancel();
            })
            .into_future();

        tokio::select! {
            result = server => result,
            _ = async {
                signalled.cancelled().await;
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!(
                    timeout_ms = shutdown_timeout.as_millis() as u64,
                    "Graceful shutdown timed out, dropping open connections"
                );
                Ok(())
            }
        }
    }
}
