use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tandem_config::Config;
use tandem_embeddings::OpenAiEmbedder;
use tandem_llm::{LlmState, OpenAiBackend};
use tandem_routing::{Embedder, ModelPair, RoutingController, StrategyRegistry};
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Loads every configured strategy up front, including the arena
    /// corpora of similarity-weighted strategies, so startup fails fast on
    /// bad routing data.
    ///
    /// # Errors
    ///
    /// Returns an error if the routing timeout is malformed or a strategy
    /// cannot be built
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();
        let timeout = config.routing.timeout()?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::from_config(&config.embeddings));
        let strategies = StrategyRegistry::from_config(&config.routing, &embedder)?;
        let controller = RoutingController::new(ModelPair::from(&config.routing), strategies, timeout);

        tracing::info!(
            strong = %controller.pair().strong(),
            weak = %controller.pair().weak(),
            strategies = ?controller.strategies(),
            timeout_ms = timeout.as_millis(),
            "routing controller ready"
        );

        let llm_state = LlmState::new(Arc::new(controller), OpenAiBackend::from_config(&config.backend));

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health));
        }

        app = app.merge(tandem_llm::llm_router(llm_state));
        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

/// Liveness probe; answers as long as the server is accepting requests
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    fn config(extra: &str) -> Config {
        Config::parse(&format!(
            r#"
            [routing]
            strong_model = "gpt-4o"
            weak_model = "gpt-4o-mini"
            {extra}
            "#
        ))
        .unwrap()
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_and_default_strategy() {
        let server = Server::new(&config("")).unwrap();
        assert_eq!(server.listen_address().port(), tandem_config::DEFAULT_PORT);
        let router = server.into_router();

        let (status, body) = get(router.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");

        let (status, body) = get(router, "/v1/models").await;
        assert_eq!(status, StatusCode::OK);
        let models: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(models["data"][0]["id"], "router-random");
    }

    #[tokio::test]
    async fn health_path_is_configurable() {
        let config = Config::parse(
            r#"
            [server.health]
            path = "/livez"

            [routing]
            strong_model = "gpt-4o"
            weak_model = "gpt-4o-mini"
            "#,
        )
        .unwrap();
        let router = Server::new(&config).unwrap().into_router();

        let (status, _) = get(router.clone(), "/livez").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(router, "/health").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn unloadable_strategy_fails_startup() {
        let config = config(
            r#"
            [routing.strategies.sw]
            type = "sw_ranking"
            battles = ["/nonexistent/battles.json"]
            embeddings = ["/nonexistent/embeddings.json"]
            "#,
        );

        assert!(Server::new(&config).is_err());
    }
}
