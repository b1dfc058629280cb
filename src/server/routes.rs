use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analysis::Analysis;
use crate::linker::ResolvedRoute;
use crate::router_id::RouterId;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RoutesParams {
    /// Only routes declared on this router, as `file:variable`
    pub router: Option<RouterId>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)>;

fn internal(e: impl ToString) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: e.to_string() }),
    )
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> ApiResult {
    serde_json::to_value(value).map(Json).map_err(internal)
}

pub async fn get_routes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoutesParams>,
) -> ApiResult {
    let analysis = state.current().await;
    match params.router {
        Some(router) => {
            let routes: Vec<&ResolvedRoute> = analysis
                .routes
                .iter()
                .filter(|route| route.router_id() == router)
                .collect();
            to_json(&routes)
        }
        None => to_json(&analysis.routes),
    }
}

pub async fn get_graph(State(state): State<Arc<AppState>>) -> ApiResult {
    to_json(&state.current().await.graph)
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult {
    to_json(&state.current().await.stats)
}

/// Re-run the whole analysis off the async runtime and swap it in.
pub async fn rescan(State(state): State<Arc<AppState>>) -> ApiResult {
    let root = state.root.clone();
    let config = state.config.clone();

    let analysis = tokio::task::spawn_blocking(move || Analysis::run(&root, &config, false))
        .await
        .map_err(internal)?
        .map_err(internal)?;

    tracing::info!("rescan finished: {} routes", analysis.routes.len());
    let stats = to_json(&analysis.stats)?;
    *state.analysis.write().await = Arc::new(analysis);
    Ok(stats)
}
