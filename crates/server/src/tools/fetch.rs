//! sw_fetch tool implementation.
//!
//! Hands one request to the router, as a page would, and reports the route
//! it took along with the response.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use otaku_core::{Destination, Error, Method, Request, RequestMode, Route, WorkerState};

use super::{Worker, json_result};

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL of the request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "no-cors" or "cors" (default).
    #[serde(default)]
    pub mode: RequestMode,

    /// Request destination: "document", "image", "script", "style", "font",
    /// "manifest", "worker" or "empty" (default).
    #[serde(default)]
    pub destination: Destination,

    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body, sent as UTF-8.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// Worker state when the request arrived.
    pub state: WorkerState,
    /// Route taken, or null when the worker was not active and the request
    /// went straight to the network.
    pub route: Option<Route>,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// URL the response was produced for, if any.
    pub url: Option<String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let method: Method = params.method.parse()?;
    let url = Url::parse(&params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;

    let mut request = Request::new(method, url)
        .with_mode(params.mode)
        .with_destination(params.destination);
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let state = worker.state().await;
    let route = (state == WorkerState::Activated).then(|| worker.route(&request));
    let response = worker.handle_fetch(&request).await?;
    tracing::debug!(url = %request.url, ?route, status = response.status, "sw_fetch");

    let output = SwFetchOutput {
        state,
        route,
        status: response.status,
        status_text: response.status_text.clone(),
        headers: response.headers.clone(),
        url: response.url.clone(),
        body: response.text(),
        body_bytes: response.body.len(),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, parse, started_worker, worker};
    use otaku_core::Response;
    use std::sync::Arc;

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams {
            url: url.into(),
            method: default_method(),
            mode: RequestMode::Cors,
            destination: Destination::Empty,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (worker, _) = started_worker().await;
        assert!(fetch_impl(&worker, params("")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_bad_method() {
        let (worker, _) = started_worker().await;
        let mut p = params("http://localhost:8080/");
        p.method = "BREW".into();
        let err = fetch_impl(&worker, p).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_fetch_api_then_offline() {
        let (worker, network) = started_worker().await;
        let url = "https://api.jikan.moe/v4/anime/52991";
        network.respond(url, Response::new(200, r#"{"data":{"mal_id":52991}}"#));

        let online: SwFetchOutput = parse(&fetch_impl(&worker, params(url)).await.unwrap());
        assert_eq!(online.route, Some(Route::Api));
        assert_eq!(online.status, 200);

        network.clear();
        let offline: SwFetchOutput = parse(&fetch_impl(&worker, params(url)).await.unwrap());
        assert_eq!(offline.status, 200);
        assert_eq!(offline.body, r#"{"data":{"mal_id":52991}}"#);
    }

    #[tokio::test]
    async fn test_fetch_navigation_serves_precached_shell() {
        let (worker, network) = started_worker().await;
        network.clear();

        let mut p = params("http://localhost:8080/");
        p.mode = RequestMode::Navigate;
        p.destination = Destination::Document;
        let output: SwFetchOutput = parse(&fetch_impl(&worker, p).await.unwrap());

        assert_eq!(output.route, Some(Route::Navigation));
        assert_eq!(output.body, "shell /");
    }

    #[tokio::test]
    async fn test_fetch_bypass_error_propagates() {
        let worker = worker(Arc::new(StubNetwork::default())).await;
        let mut p = params("http://localhost:8080/api/list");
        p.method = "POST".into();
        p.body = Some("{}".into());

        let err = fetch_impl(&worker, p).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }

    #[tokio::test]
    async fn test_fetch_before_activation_reports_passthrough() {
        let network = Arc::new(StubNetwork::default());
        let url = "https://api.jikan.moe/v4/anime/21";
        network.respond(url, Response::new(200, "{}"));
        let worker = worker(network).await;

        let output: SwFetchOutput = parse(&fetch_impl(&worker, params(url)).await.unwrap());

        assert_eq!(output.state, WorkerState::Parsed);
        assert_eq!(output.route, None);
        assert_eq!(output.status, 200);
    }
}
