//! HTTP handlers for the cluster lifecycle API
//!
//! Success bodies are JSON; errors are plain-text diagnostics produced by
//! [`Error`]'s `IntoResponse` impl.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::controller::{
    ClusterRequest, ControlPlane, Context, Error, Result, create_cluster, delete_cluster,
    get_cluster, list_clusters,
};
use crate::health::{self, HealthState};

/// `?name=` query parameter shared by get and delete
#[derive(Debug, Default, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

/// Build the application router
///
/// Serves the lifecycle routes and the probe routes on one listener. Any
/// origin may call the API.
pub fn build_router<C: ControlPlane>(ctx: Arc<Context<C>>, health_state: Arc<HealthState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/create", post(create_handler::<C>))
        .route("/get", get(get_handler::<C>))
        .route("/delete", any(delete_handler::<C>))
        .route("/list", get(list_handler::<C>))
        .with_state(ctx)
        .merge(health::create_router(health_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` on `0.0.0.0:port` until `shutdown` resolves
pub async fn run_server<F>(port: u16, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await.inspect_err(|e| {
        error!(%addr, error = %e, "Failed to bind listener");
    })?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn create_handler<C: ControlPlane>(
    State(ctx): State<Arc<Context<C>>>,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let result = match serde_json::from_slice::<ClusterRequest>(&body) {
        Ok(req) => create_cluster(&ctx, req).await,
        Err(_) => Err(Error::InvalidJson),
    };
    respond(&ctx, "create", start, result.map(Json))
}

async fn get_handler<C: ControlPlane>(
    State(ctx): State<Arc<Context<C>>>,
    Query(query): Query<NameQuery>,
) -> Response {
    let start = Instant::now();
    let result = get_cluster(&ctx, &query.name).await;
    respond(&ctx, "get", start, result.map(Json))
}

async fn delete_handler<C: ControlPlane>(
    State(ctx): State<Arc<Context<C>>>,
    Query(query): Query<NameQuery>,
) -> Response {
    let start = Instant::now();
    let result = delete_cluster(&ctx, &query.name).await;
    respond(&ctx, "delete", start, result.map(|_| StatusCode::NO_CONTENT))
}

async fn list_handler<C: ControlPlane>(State(ctx): State<Arc<Context<C>>>) -> Response {
    let start = Instant::now();
    let result = list_clusters(&ctx).await;
    respond(&ctx, "list", start, result.map(Json))
}

/// Record request metrics and render the result
fn respond<C, T>(ctx: &Context<C>, operation: &str, start: Instant, result: Result<T>) -> Response
where
    C: ControlPlane,
    T: IntoResponse,
{
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => {
            if e.status_code().is_server_error() {
                error!(operation, error = %e, "Request failed");
            } else {
                info!(operation, error = %e, "Request rejected");
            }
            e.outcome()
        }
    };
    ctx.record_request(operation, outcome, start.elapsed().as_secs_f64());

    match result {
        Ok(body) => body.into_response(),
        Err(e) => e.into_response(),
    }
}
