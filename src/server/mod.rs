//! HTTP surface for graph analytics and health checks.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::GraphError;
use crate::graph::analytics::{self, DEFAULT_PATH_FROM, DEFAULT_PATH_TO};
use crate::graph::{seed, ConnectionMode, GraphClient, Params};

const DATABASE: &str = "Neo4j";
const HEALTH_QUERY: &str = "RETURN datetime() AS time";

/// Runtime options used to boot the HTTP server.
#[derive(Clone, Debug)]
pub struct ServeOptions {
    /// Network interface to bind to.
    pub host: IpAddr,
    /// Listening port.
    pub port: u16,
    /// Allowed CORS origins.
    pub allow_origins: Vec<String>,
    /// Seed script executed by `POST /api/graph/seed`.
    pub seed_file: PathBuf,
}

impl ServeOptions {
    /// Options taken from the loaded configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            host: config.server.host,
            port: config.server.port,
            allow_origins: config.server.allow_origins.clone(),
            seed_file: config.graph.seed_file.clone(),
        }
    }
}

/// Errors that can occur while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or serving on the TCP listener failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared handler state.
pub struct ServerState {
    client: Arc<GraphClient>,
    seed_file: PathBuf,
}

impl ServerState {
    /// State serving `client`.
    pub fn new(client: Arc<GraphClient>, seed_file: PathBuf) -> Self {
        Self { client, seed_file }
    }
}

type AppState = Arc<ServerState>;

/// Binds the listener and serves until Ctrl-C.
pub async fn serve(client: Arc<GraphClient>, options: ServeOptions) -> Result<(), ServerError> {
    let addr = SocketAddr::from((options.host, options.port));
    let state = Arc::new(ServerState::new(client.clone(), options.seed_file.clone()));
    let app = build_router(state, &options.allow_origins);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        mode = %client.mode(),
        seed_file = %options.seed_file.display(),
        allow_origins = ?options.allow_origins,
        "rescuenet listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    client.shutdown().await;
    Ok(())
}

/// Builds the application router.
pub fn build_router(state: Arc<ServerState>, allow_origins: &[String]) -> Router {
    let graph = Router::new()
        .route("/team-collaboration", get(team_collaboration_handler))
        .route("/user-network", get(user_network_handler))
        .route("/resource-flow", get(resource_flow_handler))
        .route("/zone-overview", get(zone_overview_handler))
        .route("/critical-zones", get(critical_zones_handler))
        .route("/shortest-path", get(shortest_path_handler))
        .route("/most-connected", get(most_connected_handler))
        .route("/init", post(init_handler))
        .route("/seed", post(seed_handler))
        .route("/clear", delete(clear_handler))
        .route("/reconnect", post(reconnect_handler));

    let mut router = Router::new()
        .route("/api/health", get(health_handler))
        .nest("/api/graph", graph);

    if let Some(layer) = build_cors_layer(allow_origins) {
        router = router.layer(layer);
    }

    router.with_state(state).layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let mut allowed = Vec::new();
    for origin in origins {
        let trimmed = origin.trim().trim_end_matches('/');
        match HeaderValue::from_str(trimmed) {
            Ok(value) if !trimmed.is_empty() => allowed.push(value),
            _ => tracing::warn!(%origin, "ignoring invalid CORS origin"),
        }
    }

    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE]),
    )
}

async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let records = state.client.execute(HEALTH_QUERY, &Params::new()).await?;
    let time = records
        .first()
        .and_then(|record| record.get("time"))
        .and_then(|value| value.as_str())
        .unwrap_or("connected")
        .to_string();
    let mode = state.client.mode();
    let status = match mode {
        ConnectionMode::Healthy => "connected",
        ConnectionMode::Degraded => "degraded",
    };
    let mut databases = BTreeMap::new();
    databases.insert("neo4j", BackendHealth { status, mode, time });
    Ok(Json(HealthResponse {
        status: "ok",
        timestamp: now_rfc3339(),
        databases,
    }))
}

async fn team_collaboration_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<analytics::TeamLink>>, AppError> {
    let data = analytics::team_collaboration(&state.client).await?;
    Ok(Json(ListResponse::new("Team Collaboration Network", data)))
}

async fn user_network_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<analytics::UserLinks>>, AppError> {
    let data = analytics::user_network(&state.client).await?;
    Ok(Json(ListResponse::new("User Network Analysis", data)))
}

async fn resource_flow_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<analytics::ResourceFlow>>, AppError> {
    let data = analytics::resource_flow(&state.client).await?;
    Ok(Json(ListResponse::new(
        "Resource Flow from Centers to Zones",
        data,
    )))
}

async fn zone_overview_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<analytics::ZoneOverview>>, AppError> {
    let data = analytics::zone_overview(&state.client).await?;
    Ok(Json(ListResponse::new(
        "Zone Overview with All Relationships",
        data,
    )))
}

async fn critical_zones_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<analytics::CriticalZone>>, AppError> {
    let data = analytics::critical_zones(&state.client).await?;
    Ok(Json(ListResponse::new(
        "Critical Zones Needing More Teams",
        data,
    )))
}

async fn shortest_path_handler(
    State(state): State<AppState>,
    Query(params): Query<PathParams>,
) -> Result<Json<PathResponse>, AppError> {
    let from = params.from.unwrap_or_else(|| DEFAULT_PATH_FROM.to_string());
    let to = params.to.unwrap_or_else(|| DEFAULT_PATH_TO.to_string());
    let data = analytics::shortest_path(&state.client, &from, &to).await?;
    Ok(Json(PathResponse {
        database: DATABASE,
        query: "Shortest Path Between Entities",
        from,
        to,
        data,
    }))
}

async fn most_connected_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<analytics::HubNode>>, AppError> {
    let data = analytics::most_connected(&state.client).await?;
    Ok(Json(ListResponse::new(
        "Most Connected Entities (Hub Analysis)",
        data,
    )))
}

async fn init_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>, AppError> {
    let statements = analytics::initialize_schema(&state.client).await?;
    tracing::info!(statements, "graph schema initialized");
    Ok(Json(MessageResponse::new(
        "Graph schema initialized (constraints, indexes)",
    )))
}

async fn seed_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>, AppError> {
    seed::seed_file(&state.client, &state.seed_file)
        .await
        .map_err(|err| match err {
            GraphError::Io { source, .. } if source.kind() == ErrorKind::NotFound => {
                AppError::SeedNotFound
            }
            other => AppError::Graph(other),
        })?;
    Ok(Json(MessageResponse::new(
        "Graph seeded with sample nodes and relationships",
    )))
}

async fn clear_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>, AppError> {
    analytics::clear_graph(&state.client).await?;
    Ok(Json(MessageResponse::new("All graph data cleared")))
}

async fn reconnect_handler(State(state): State<AppState>) -> Json<ReconnectResponse> {
    let healthy = state.client.reinitialize().await;
    Json(ReconnectResponse {
        database: DATABASE,
        healthy,
        mode: state.client.mode(),
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    databases: BTreeMap<&'static str, BackendHealth>,
}

#[derive(Debug, Serialize)]
struct BackendHealth {
    status: &'static str,
    mode: ConnectionMode,
    time: String,
}

#[derive(Debug, Serialize)]
struct ListResponse<T> {
    database: &'static str,
    query: &'static str,
    count: usize,
    data: Vec<T>,
}

impl<T> ListResponse<T> {
    fn new(query: &'static str, data: Vec<T>) -> Self {
        Self {
            database: DATABASE,
            query,
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PathParams {
    from: Option<String>,
    to: Option<String>,
}

#[derive(Debug, Serialize)]
struct PathResponse {
    database: &'static str,
    query: &'static str,
    from: String,
    to: String,
    data: Option<analytics::PathSummary>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    database: &'static str,
    message: &'static str,
}

impl MessageResponse {
    fn new(message: &'static str) -> Self {
        Self {
            database: DATABASE,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReconnectResponse {
    database: &'static str,
    healthy: bool,
    mode: ConnectionMode,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Seed file not found")]
    SeedNotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::SeedNotFound => StatusCode::NOT_FOUND,
            AppError::Graph(GraphError::EmptyQuery | GraphError::InvalidParameterName(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Graph(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorPayload {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    error: String,
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}
