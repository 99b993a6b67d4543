use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::extract::REQUEST_ID_HEADER;

/// Router builder. [`AxumApp::into_router`] adds the standard layers:
/// request ids (generated when absent, echoed on the response) and HTTP
/// tracing.
#[derive(Clone, Default)]
pub struct AxumApp {
    router: Router<()>,
}

impl AxumApp {
    pub fn new(router: Router<()>) -> Self {
        Self { router }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    pub fn merge(mut self, router: Router<()>) -> Self {
        self.router = self.router.merge(router);
        self
    }

    /// Adds `GET /health` answering `ok`.
    pub fn with_health(mut self) -> Self {
        self.router = self.router.route("/health", get(|| async { "ok" }));
        self
    }

    pub fn into_router(self) -> Router<()> {
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id));
        self.router.layer(layers)
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = ?listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum(router: Router<()>) -> AxumApp {
    AxumApp::new(router)
}
