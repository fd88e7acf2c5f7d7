use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use eventlog_store::{Database, EventRepo};
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::pagination::PageLimits;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub limits: PageLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            limits: PageLimits::default(),
        }
    }
}

/// Shared application state passed to Axum handlers.
///
/// Built once from an explicitly opened [`Database`]; nothing here is
/// process-global.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub repo: Arc<EventRepo>,
    pub limits: PageLimits,
}

impl AppState {
    pub fn new(db: Database, limits: PageLimits) -> Self {
        Self {
            repo: Arc::new(EventRepo::new(db.clone())),
            db,
            limits,
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route("/events/count", get(handlers::count_events))
        .route("/events/summary", get(handlers::event_summary))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the listener and serve in the background. Returns a handle to shut
/// it down.
pub async fn start(config: ServerConfig, db: Database) -> Result<ServerHandle, std::io::Error> {
    let state = AppState::new(db, config.limits);
    let router = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "eventlog server started");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "server exited with error");
        }
    });

    Ok(ServerHandle {
        local_addr,
        shutdown_tx,
        server,
    })
}

/// Handle returned by `start()`. Dropping it leaves the server running
/// until the runtime stops; call [`ServerHandle::shutdown`] to drain.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.server.await {
            tracing::error!(error = %e, "server task failed");
        }
        tracing::info!("eventlog server stopped");
    }
}
