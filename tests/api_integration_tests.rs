//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle, including every link of the
//! fallback chain, against a scripted upstream and an in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use pnode_monitor::{
    api::create_router,
    config::{Config, MockMode},
    models::{Location, NodeRecord, NodeStatus, Storage},
    service::ALL_NODES_KEY,
    store::{MemoryNodeStore, NodeStore},
    upstream::{FetchError, FetchErrorKind, Upstream},
    AppState, NodeService,
};
use serde_json::{Map, Value};
use tower::ServiceExt;

// == Scripted Upstream ==

enum Script {
    Nodes(Vec<NodeRecord>),
    Fail(FetchErrorKind),
}

struct ScriptedUpstream {
    script: Mutex<Script>,
    calls: AtomicUsize,
}

impl ScriptedUpstream {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    fn set(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn fetch_all_nodes(&self) -> Result<Vec<NodeRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.script.lock().unwrap() {
            Script::Nodes(nodes) => Ok(nodes.clone()),
            Script::Fail(kind) => Err(FetchError::new(*kind, "scripted failure")),
        }
    }

    async fn fetch_node_by_id(&self, id: &str) -> Result<NodeRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.script.lock().unwrap() {
            Script::Nodes(nodes) => nodes
                .iter()
                .find(|n| n.id == id)
                .cloned()
                .ok_or_else(|| FetchError::http(404, "no such pNode")),
            Script::Fail(kind) => Err(FetchError::new(*kind, "scripted failure")),
        }
    }
}

// == Helper Functions ==

fn node(id: &str, status: NodeStatus, region: &str, uptime: u64) -> NodeRecord {
    NodeRecord {
        id: id.to_string(),
        status,
        storage: Storage::new(25, 100),
        location: Location {
            region: region.to_string(),
            ..Location::default()
        },
        uptime,
        version: "1.2.3".to_string(),
        last_seen: Utc::now(),
        metadata: Map::new(),
    }
}

struct Harness {
    app: Router,
    service: Arc<NodeService>,
    upstream: Arc<ScriptedUpstream>,
    store: Arc<MemoryNodeStore>,
}

fn harness(script: Script, stored: Vec<NodeRecord>, mock_mode: MockMode) -> Harness {
    let config = Config {
        mock_mode,
        mock_seed: Some(99),
        ..Config::default()
    };
    let upstream = ScriptedUpstream::new(script);
    let store = Arc::new(MemoryNodeStore::with_records(stored));
    let service = Arc::new(NodeService::from_config(&config, upstream.clone(), store.clone()));
    let app = create_router(AppState::new(service.clone(), &config));

    Harness {
        app,
        service,
        upstream,
        store,
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn assert_storage_consistent(data: &[Value]) {
    for record in data {
        let storage = &record["storage"];
        assert_eq!(
            storage["used"].as_u64().unwrap() + storage["available"].as_u64().unwrap(),
            storage["total"].as_u64().unwrap(),
            "storage mismatch for {}",
            record["id"]
        );
    }
}

// == List Endpoint ==

#[tokio::test]
async fn test_end_to_end_upstream_list() {
    let h = harness(
        Script::Nodes(vec![
            node("n1", NodeStatus::Active, "Europe", 100),
            node("n2", NodeStatus::Gossiping, "Asia", 200),
        ]),
        vec![],
        MockMode::Fallback,
    );

    let (status, json) = send(&h.app, "GET", "/pnodes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["source"], "upstream");
    assert_eq!(json["cached"], false);
    assert_eq!(json["count"], 2);
    assert!(json.get("origin").is_none());
    assert_storage_consistent(json["data"].as_array().unwrap());

    assert_eq!(h.store.find_all().await.unwrap().len(), 2);
    let cached = h.service.cache().write().await.get(ALL_NODES_KEY).unwrap();
    assert_eq!(cached.nodes.len(), 2);
}

#[tokio::test]
async fn test_second_request_served_from_cache() {
    let h = harness(
        Script::Nodes(vec![node("n1", NodeStatus::Active, "Europe", 1)]),
        vec![],
        MockMode::Fallback,
    );

    send(&h.app, "GET", "/pnodes").await;
    let (_, json) = send(&h.app, "GET", "/pnodes").await;

    assert_eq!(json["source"], "cache");
    assert_eq!(json["cached"], true);
    assert_eq!(json["origin"], "upstream");
    assert_eq!(h.upstream.calls(), 1);
}

#[tokio::test]
async fn test_refresh_bypasses_cache_read_and_updates_cache() {
    let h = harness(
        Script::Nodes(vec![node("n1", NodeStatus::Active, "Europe", 1)]),
        vec![],
        MockMode::Fallback,
    );
    send(&h.app, "GET", "/pnodes").await;

    h.upstream.set(Script::Nodes(vec![
        node("n1", NodeStatus::Active, "Europe", 1),
        node("n3", NodeStatus::Offline, "Africa", 0),
    ]));
    let (_, refreshed) = send(&h.app, "GET", "/pnodes?refresh=true").await;
    assert_eq!(refreshed["source"], "upstream");
    assert_eq!(refreshed["count"], 2);

    let (_, after) = send(&h.app, "GET", "/pnodes").await;
    assert_eq!(after["cached"], true);
    assert_eq!(after["count"], 2);
    assert_eq!(h.upstream.calls(), 2);
}

#[tokio::test]
async fn test_refresh_flag_variants() {
    let h = harness(
        Script::Nodes(vec![node("n1", NodeStatus::Active, "Europe", 1)]),
        vec![],
        MockMode::Fallback,
    );
    send(&h.app, "GET", "/pnodes").await;

    send(&h.app, "GET", "/pnodes?refresh=1").await;
    send(&h.app, "GET", "/pnodes?refresh=YES").await;
    assert_eq!(h.upstream.calls(), 3);

    let (status, bare) = send(&h.app, "GET", "/pnodes?refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bare["cached"], true);

    let (_, json) = send(&h.app, "GET", "/pnodes?refresh=nope").await;
    assert_eq!(json["cached"], true);
    assert_eq!(h.upstream.calls(), 3);
}

#[tokio::test]
async fn test_upstream_down_serves_database() {
    let h = harness(
        Script::Fail(FetchErrorKind::Dns),
        vec![
            node("s1", NodeStatus::Active, "Europe", 10),
            node("s2", NodeStatus::Offline, "Asia", 0),
        ],
        MockMode::Fallback,
    );

    let (status, json) = send(&h.app, "GET", "/pnodes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "database");
    assert_eq!(json["count"], 2);
    for record in json["data"].as_array().unwrap() {
        assert!(record["metadata"].get("source").is_none());
    }
}

#[tokio::test]
async fn test_upstream_down_empty_store_serves_mock() {
    let h = harness(Script::Fail(FetchErrorKind::Timeout), vec![], MockMode::Fallback);

    let (status, json) = send(&h.app, "GET", "/pnodes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "mock");
    assert!(json["note"].is_string());
    let data = json["data"].as_array().unwrap();
    assert!(!data.is_empty());
    assert!(data.iter().all(|r| r["metadata"]["source"] == "mock"));
    assert_storage_consistent(data);
    assert!(h.store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mock_off_serves_empty_database_payload() {
    let h = harness(Script::Fail(FetchErrorKind::Network), vec![], MockMode::Off);

    let (status, json) = send(&h.app, "GET", "/pnodes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "database");
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_normalization_failure_returns_500() {
    let h = harness(
        Script::Fail(FetchErrorKind::Normalization),
        vec![node("s1", NodeStatus::Active, "Europe", 10)],
        MockMode::Fallback,
    );

    let (status, json) = send(&h.app, "GET", "/pnodes").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("malformed"));
}

// == Node Endpoint ==

#[tokio::test]
async fn test_get_node_from_upstream() {
    let h = harness(
        Script::Nodes(vec![node("n1", NodeStatus::Active, "Europe", 1)]),
        vec![],
        MockMode::Fallback,
    );

    let (status, json) = send(&h.app, "GET", "/pnodes/n1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "upstream");
    assert_eq!(json["data"]["id"], "n1");

    let (_, again) = send(&h.app, "GET", "/pnodes/n1").await;
    assert_eq!(again["source"], "cache");
}

#[tokio::test]
async fn test_get_node_from_database() {
    let h = harness(
        Script::Fail(FetchErrorKind::Network),
        vec![node("s1", NodeStatus::Gossiping, "Asia", 5)],
        MockMode::Fallback,
    );

    let (status, json) = send(&h.app, "GET", "/api/pnodes/s1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "database");
    assert_eq!(json["data"]["status"], "gossiping");
}

#[tokio::test]
async fn test_get_node_not_found() {
    let h = harness(
        Script::Fail(FetchErrorKind::Network),
        vec![node("s1", NodeStatus::Active, "Europe", 5)],
        MockMode::Fallback,
    );

    let (status, json) = send(&h.app, "GET", "/pnodes/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "pNode not found");
}

// == Stats Endpoint ==

#[tokio::test]
async fn test_stats_from_database() {
    let h = harness(
        Script::Fail(FetchErrorKind::Dns),
        vec![
            node("a", NodeStatus::Active, "Europe", 10),
            node("b", NodeStatus::Active, "Europe", 15),
            node("c", NodeStatus::Gossiping, "Asia", 20),
            node("d", NodeStatus::Offline, "Africa", 0),
        ],
        MockMode::Fallback,
    );

    let (status, json) = send(&h.app, "GET", "/pnodes/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "database");
    let data = &json["data"];
    assert_eq!(data["total"], 4);
    assert_eq!(data["active"], 2);
    assert_eq!(data["gossiping"], 1);
    assert_eq!(data["offline"], 1);
    assert_eq!(data["averageUptime"], 11);
    assert_eq!(data["byRegion"]["Europe"], 2);
    assert_eq!(data["totalStorage"]["total"], 400);
    assert_eq!(data["healthPercentage"], 50.0);
}

#[tokio::test]
async fn test_stats_from_mock_when_store_empty() {
    let h = harness(Script::Fail(FetchErrorKind::Dns), vec![], MockMode::Fallback);

    let (status, json) = send(&h.app, "GET", "/pnodes/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "mock");
    assert_eq!(json["data"]["total"], 12);
}

#[tokio::test]
async fn test_stats_empty_without_mock() {
    let h = harness(Script::Fail(FetchErrorKind::Dns), vec![], MockMode::Off);

    let (_, json) = send(&h.app, "GET", "/pnodes/stats").await;
    assert_eq!(json["data"]["total"], 0);
    assert_eq!(json["data"]["averageUptime"], 0);
}

// == Health and Cache Endpoints ==

#[tokio::test]
async fn test_health_endpoint() {
    let h = harness(Script::Nodes(vec![]), vec![], MockMode::Fallback);

    for uri in ["/health", "/api/health"] {
        let (status, json) = send(&h.app, "GET", uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["service"], "pNode Analytics API");
        assert!(json["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_cache_stats_and_eviction() {
    let h = harness(
        Script::Nodes(vec![node("n1", NodeStatus::Active, "Europe", 1)]),
        vec![],
        MockMode::Fallback,
    );
    send(&h.app, "GET", "/pnodes").await;
    send(&h.app, "GET", "/pnodes").await;
    send(&h.app, "GET", "/pnodes/n1").await;

    let (status, stats) = send(&h.app, "GET", "/cache/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["size"], 2);
    assert_eq!(stats["data"]["hits"], 1);
    assert_eq!(stats["data"]["ttl"], 30);

    let (_, deleted) = send(&h.app, "DELETE", "/cache/pnode_n1").await;
    assert_eq!(deleted["deleted"], 1);

    let (_, cleared) = send(&h.app, "DELETE", "/api/cache").await;
    assert_eq!(cleared["deleted"], 1);

    let (_, json) = send(&h.app, "GET", "/pnodes").await;
    assert_eq!(json["cached"], false);
}

#[tokio::test]
async fn test_unknown_route_returns_404_with_path() {
    let h = harness(Script::Nodes(vec![]), vec![], MockMode::Fallback);

    let (status, json) = send(&h.app, "GET", "/nothing/here").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Route not found");
    assert_eq!(json["path"], "/nothing/here");
}
