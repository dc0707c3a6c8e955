//! Shared fixtures for tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;

use otaku_core::{AppConfig, CacheDb, Error, Network, Request, Response, ServiceWorker};

use super::Worker;

/// Answers from a URL table; everything else is unreachable.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
}

impl StubNetwork {
    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn clear(&self) {
        self.routes.lock().unwrap().clear();
    }

    /// Serve the default precache manifest.
    pub(crate) fn app_shell() -> Self {
        let network = Self::default();
        for path in AppConfig::default().precache {
            network.respond(&format!("http://localhost:8080{path}"), Response::new(200, format!("shell {path}")));
        }
        network
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))
    }
}

pub(crate) async fn worker(network: Arc<StubNetwork>) -> Arc<Worker> {
    let store = CacheDb::open_in_memory().await.unwrap();
    let network: Arc<dyn Network> = network;
    Arc::new(ServiceWorker::new(AppConfig::default(), store, network).unwrap())
}

/// Worker that has already installed and activated against the app shell.
pub(crate) async fn started_worker() -> (Arc<Worker>, Arc<StubNetwork>) {
    let network = Arc::new(StubNetwork::app_shell());
    let worker = worker(network.clone()).await;
    worker.start().await.unwrap();
    (worker, network)
}

pub(crate) fn parse<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
