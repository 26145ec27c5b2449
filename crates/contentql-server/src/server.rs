use std::net::SocketAddr;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use contentql_graphql::{GraphQLState, graphql_handler, graphql_handler_get, sdl_handler};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::bootstrap::{ContentEngine, init_engine};
use crate::{config::AppConfig, handlers, middleware as app_middleware};

/// State shared by all routes.
#[derive(Clone)]
pub struct AppState {
    pub graphql: GraphQLState,
}

impl FromRef<AppState> for GraphQLState {
    fn from_ref(state: &AppState) -> Self {
        state.graphql.clone()
    }
}

pub struct ContentqlServer {
    addr: SocketAddr,
    app: Router,
    engine: ContentEngine,
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // GraphQL
        .route("/graphql", post(graphql_handler).get(graphql_handler_get))
        .route("/graphql/sdl", get(sdl_handler))
        // Middleware stack, outermost last: request id wraps trace so spans see the id
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .headers()
                        .get(app_middleware::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Starts the schema machinery and builds the router.
    pub async fn build(self) -> anyhow::Result<ContentqlServer> {
        let engine = init_engine(&self.config).await?;
        let state = AppState {
            graphql: GraphQLState::new(engine.live.clone(), engine.repository.clone()),
        };
        let app = build_app(&self.config, state);

        Ok(ContentqlServer {
            addr: self.addr,
            app,
            engine,
        })
    }
}

impl ContentqlServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        self.engine.shutdown().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
