use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analysis::Analysis;
use crate::config::RoutemapConfig;
use crate::ui::Icons;

pub mod routes;

/// Server state
pub struct AppState {
    pub root: PathBuf,
    pub config: RoutemapConfig,
    /// Latest finished analysis; replaced wholesale on rescan
    pub analysis: RwLock<Arc<Analysis>>,
}

impl AppState {
    pub fn new(root: PathBuf, config: RoutemapConfig, analysis: Analysis) -> Self {
        Self {
            root,
            config,
            analysis: RwLock::new(Arc::new(analysis)),
        }
    }

    pub async fn current(&self) -> Arc<Analysis> {
        Arc::clone(&*self.analysis.read().await)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/routes", get(routes::get_routes))
        .route("/api/graph", get(routes::get_graph))
        .route("/api/stats", get(routes::get_stats))
        .route("/api/rescan", post(routes::rescan))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    eprintln!("{} Server running at http://{}", Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
