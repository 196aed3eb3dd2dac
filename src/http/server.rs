//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router from the controller routes
//! - Wire up middleware (request ID, tracing, timeout, body limit, metrics)
//! - Serve on a bound listener until shutdown is signalled

use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::middleware;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::controller::{self, ControllerState};
use crate::http::request::{
    make_request_span, propagate_request_id_layer, set_request_id_layer, track_metrics,
};

/// HTTP front end for the controller.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: ControllerState) -> Self {
        Self {
            router: Self::build_router(&config, state),
        }
    }

    /// Controller routes wrapped in the middleware stack.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: ControllerState) -> Router {
        controller::router(state)
            .route_layer(middleware::from_fn(track_metrics))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(RequestBodyLimitLayer::new(config.max_body_size))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| make_request_span(req)))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Router with all middleware, for embedding or testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Listening...");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
