//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with one catch-all handler
//! - Wire up tracing middleware
//! - Serve on a bound listener until shutdown

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::http::dispatcher::Dispatcher;
use crate::lifecycle::signals::shutdown_signal;

/// HTTP server in front of the dispatcher.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            router: Self::build_router(dispatcher),
        }
    }

    /// Every path and method goes to the dispatcher.
    fn build_router(dispatcher: Dispatcher) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(dispatcher)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = shutdown_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(
    State(dispatcher): State<Dispatcher>,
    request: Request<Body>,
) -> Response<Body> {
    dispatcher.handle(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::DispatchOptions;
    use crate::observability::{LogFilter, SharedBuffer, TrafficLog};
    use crate::responders::{upstream_client, Responder, StaticResponder};
    use crate::routing::ProxyRouter;
    use axum::http::{HeaderMap, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_every_path_and_method_reaches_dispatcher() {
        let responder = Responder::Static(StaticResponder::new(StatusCode::IM_A_TEAPOT, HeaderMap::new()));
        let dispatcher = Dispatcher::new(
            Arc::new(responder),
            ProxyRouter::new(upstream_client()),
            LogFilter::allow_all(),
            TrafficLog::new(SharedBuffer::default()),
            DispatchOptions::default(),
        );
        let router = HttpServer::build_router(dispatcher);

        for (method, path) in [("GET", "/"), ("DELETE", "/a/b/c"), ("PATCH", "/proxy"), ("OPTIONS", "/x?y=z")] {
            let request = Request::builder()
                .method(method)
                .uri(path)
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::IM_A_TEAPOT, "{} {}", method, path);
        }
    }
}
