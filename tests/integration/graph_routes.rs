#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rescuenet::{
    graph::GraphClient,
    server::{build_router, ServerState},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn mock_router(seed_file: PathBuf) -> Router {
    let client = Arc::new(GraphClient::mock_only());
    let state = Arc::new(ServerState::new(client, seed_file));
    build_router(state, &["http://localhost:3000".to_string()])
}

async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

#[tokio::test]
async fn health_reports_degraded_backend() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (status, body) = call(app, Method::GET, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["databases"]["neo4j"]["status"], "degraded");
    assert_eq!(body["databases"]["neo4j"]["mode"], "degraded");
    assert!(body["timestamp"].as_str().is_some_and(|ts| ts.contains('T')));
}

#[tokio::test]
async fn team_collaboration_serves_mock_links() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (status, body) = call(app, Method::GET, "/api/graph/team-collaboration").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "Neo4j");
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["team1"], "Alpha Response");
    assert_eq!(body["data"][0]["team2"], "Bravo Medical");
    assert_eq!(body["data"][1]["reason"], "Equipment Supply");
}

#[tokio::test]
async fn user_network_and_resource_flow_use_their_templates() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (_, users) = call(app.clone(), Method::GET, "/api/graph/user-network").await;
    assert_eq!(users["count"], 2);
    assert_eq!(users["data"][0]["teamsLed"][0], "Alpha");

    let (_, flow) = call(app, Method::GET, "/api/graph/resource-flow").await;
    assert_eq!(flow["count"], 2);
    assert_eq!(flow["data"][0]["centerName"], "Kochi Hub");
    assert_eq!(flow["data"][0]["severity"], 5);
}

#[tokio::test]
async fn critical_zones_expose_disaster_type() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (status, body) = call(app, Method::GET, "/api/graph/critical-zones").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["type"], "landslide");
    assert_eq!(body["data"][0]["teamCount"], 1);
}

#[tokio::test]
async fn shortest_path_echoes_endpoints() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (status, body) = call(
        app,
        Method::GET,
        "/api/graph/shortest-path?from=Alpha&to=Zone%201",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from"], "Alpha");
    assert_eq!(body["to"], "Zone 1");
    assert_eq!(body["data"]["nodes"][1], "Zone 1");
    assert_eq!(body["data"]["relations"][0], "ASSIGNED_TO");
    assert_eq!(body["data"]["length"], 1);
}

#[tokio::test]
async fn shortest_path_defaults_endpoints() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (_, body) = call(app, Method::GET, "/api/graph/shortest-path").await;
    assert_eq!(body["from"], "Alpha Team");
    assert_eq!(body["to"], "Kerala Landslide Area");
}

#[tokio::test]
async fn unmatched_queries_fall_back_to_generic_rows() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (_, body) = call(app, Method::GET, "/api/graph/most-connected").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["name"], "Mock Node");
}

#[tokio::test]
async fn seed_reports_missing_script() {
    let dir = TempDir::new().expect("tempdir");
    let app = mock_router(dir.path().join("graph_seed.cypher"));
    let (status, body) = call(app, Method::POST, "/api/graph/seed").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Seed file not found");
}

#[tokio::test]
async fn seed_runs_existing_script() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("graph_seed.cypher");
    std::fs::write(
        &path,
        "CREATE (:Team {name: 'Alpha'});\nCREATE (:Zone {name: 'Wayanad'});\n",
    )
    .expect("write seed");
    let app = mock_router(path);
    let (status, body) = call(app, Method::POST, "/api/graph/seed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Graph seeded with sample nodes and relationships"
    );
}

#[tokio::test]
async fn init_and_clear_succeed_in_mock_mode() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (status, _) = call(app.clone(), Method::POST, "/api/graph/init").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(app, Method::DELETE, "/api/graph/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All graph data cleared");
}

#[tokio::test]
async fn reconnect_without_backend_stays_degraded() {
    let app = mock_router(PathBuf::from("missing.cypher"));
    let (status, body) = call(app, Method::POST, "/api/graph/reconnect").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], false);
    assert_eq!(body["mode"], "degraded");
}
