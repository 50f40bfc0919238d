//! Shared harness for API integration tests: an app wired to a fake AI
//! gateway and scraper, and a JSON request helper.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use bytes::Bytes;
use renoplan_core::{AiGateway, GatewayStream, PageScraper, RenoplanError, Store, ToolSpec};
use renoplan_server::{app, config::Config, state::AppState};
use renoplan_types::ChatTurn;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const HELLO_FRAMES: &[&str] = &[
    ": keep-alive\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
    "data: [DONE]\n\n",
];

/// Gateway that streams [`HELLO_FRAMES`] (or fails with a fixed status) and
/// answers tool calls from a table keyed by tool name.
#[derive(Default)]
pub struct FakeGateway {
    pub fail_status: Option<u16>,
    pub fail_body: String,
    pub tools: HashMap<&'static str, Value>,
    pub last_system: Mutex<Option<String>>,
}

impl FakeGateway {
    pub fn with_tool(mut self, name: &'static str, response: Value) -> Self {
        self.tools.insert(name, response);
        self
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            fail_status: Some(status),
            fail_body: body.to_string(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl AiGateway for FakeGateway {
    async fn stream_chat(&self, system: &str, _turns: &[ChatTurn]) -> renoplan_core::Result<GatewayStream> {
        *self.last_system.lock().unwrap() = Some(system.to_string());
        if let Some(status) = self.fail_status {
            return Err(RenoplanError::Upstream {
                status,
                message: self.fail_body.clone(),
            });
        }
        let frames: Vec<renoplan_core::Result<Bytes>> = HELLO_FRAMES
            .iter()
            .map(|f| Ok(Bytes::from_static(f.as_bytes())))
            .collect();
        Ok(Box::pin(futures::stream::iter(frames)))
    }

    async fn call_tool(
        &self,
        _system: &str,
        _turns: &[ChatTurn],
        tool: &ToolSpec,
    ) -> renoplan_core::Result<Value> {
        self.tools
            .get(tool.name)
            .cloned()
            .ok_or_else(|| RenoplanError::MalformedResponse(format!("no canned {}", tool.name)))
    }
}

/// Scraper that returns the same small results page for every URL.
pub struct FakeScraper;

#[async_trait]
impl PageScraper for FakeScraper {
    async fn scrape(&self, url: &str) -> renoplan_core::Result<String> {
        Ok(format!("# Search results\n\nFetched from {}\n\n- Widget A $9.99", url))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<Store>,
    pub gateway: Arc<FakeGateway>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new(gateway: FakeGateway) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.db_path = dir.path().join("renoplan.db");
        config.anonymous_dir = dir.path().join("anonymous");
        config.static_dir = dir.path().join("static");

        let store = Arc::new(Store::open(&config.db_path).unwrap());
        let gateway = Arc::new(gateway);
        let state = AppState::with_services(config, store.clone(), gateway.clone(), Arc::new(FakeScraper));

        Self {
            router: app(Arc::new(state)),
            store,
            gateway,
            _dir: dir,
        }
    }

    /// Serve the app on an ephemeral local port.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Send a request and return the status and raw body.
    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, bytes)
    }

    /// Send a request and parse the JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.raw(method, uri, user, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        (status, json)
    }
}

/// Canned bill of materials totalling 25.
pub fn bom_response() -> Value {
    json!({
        "title": "Powder room refresh",
        "items": [
            {"category": "Fixtures", "name": "Faucet", "quantity": 2, "unit": "each", "estimated_unit_price": 10, "priority": "essential"},
            {"category": "Finishes", "name": "Paint", "quantity": 1, "unit": "gallon", "estimated_unit_price": 5},
        ],
    })
}

pub fn products_response() -> Value {
    json!({
        "products": [
            {"product_name": "Chrome faucet", "product_url": "https://shop.example/faucet", "price": 89.0, "match_score": 0.92},
            {"product_name": "Brass faucet", "product_url": "javascript:alert(1)", "price": 120.0, "match_score": 1.7},
        ],
    })
}
