//! Per-route fetch strategies.
//!
//! Cache reads that fail are treated as misses and cache writes that fail
//! are logged and dropped; neither ever fails the request.

use super::offline::OFFLINE_PAGE;
use super::{Network, Route, ServiceWorker, WorkerState};
use crate::Error;
use crate::cache::{CacheKey, CacheStore};
use crate::config::Purpose;
use crate::http::{Method, Request, Response};

impl<S: CacheStore, N: Network> ServiceWorker<S, N> {
    /// Handle one intercepted request.
    ///
    /// Only non-GET passthrough and static-asset network failures return
    /// `Err`; every other path ends in a response. Before activation the
    /// page is not controlled and requests go straight to the network.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Response, Error> {
        if self.state().await != WorkerState::Activated {
            tracing::debug!(url = %request.url, "worker not active, passing through");
            return self.network.fetch(request).await;
        }

        let route = self.route(request);
        tracing::debug!(url = %request.url, ?route, "routing request");

        match route {
            Route::Bypass => self.network.fetch(request).await,
            Route::Api => Ok(self.api_network_first(request).await),
            Route::CdnImage => Ok(self.image_cache_first(request).await),
            Route::StaticAsset => self.static_cache_first(request).await,
            Route::Navigation => Ok(self.navigation_network_first(request).await),
            Route::Default => Ok(self.default_network_first(request).await),
        }
    }

    async fn api_network_first(&self, request: &Request) -> Response {
        let partition = self.partitions.name(Purpose::Api);
        let key = CacheKey::for_request(request);

        match self.network.fetch(request).await {
            Ok(response) => {
                self.write_through(partition, &key, &response).await;
                response
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "api fetch failed, trying cache");
                if let Some(cached) = self.cache_get(partition, &key).await {
                    return cached;
                }
                Response::json(
                    503,
                    &serde_json::json!({
                        "error": "offline",
                        "message": "Données indisponibles hors ligne",
                    }),
                )
            }
        }
    }

    async fn image_cache_first(&self, request: &Request) -> Response {
        let partition = self.partitions.name(Purpose::Image);
        let key = CacheKey::for_request(request);

        if let Some(cached) = self.cache_get(partition, &key).await {
            return cached;
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.write_through(partition, &key, &response).await;
                response
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "image unavailable");
                Response::empty(404)
            }
        }
    }

    async fn static_cache_first(&self, request: &Request) -> Result<Response, Error> {
        let key = CacheKey::for_request(request);

        if let Some(cached) = self.cache_match(&key).await {
            return Ok(cached);
        }

        let response = self.network.fetch(request).await?;
        self.write_through(self.partitions.name(Purpose::Static), &key, &response)
            .await;
        Ok(response)
    }

    async fn navigation_network_first(&self, request: &Request) -> Response {
        let key = CacheKey::for_request(request);

        match self.network.fetch(request).await {
            Ok(response) => {
                self.write_through(self.partitions.name(Purpose::Static), &key, &response)
                    .await;
                response
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "navigation failed, serving from cache");
                if let Some(cached) = self.cache_match(&key).await {
                    return cached;
                }
                if let Ok(root) = request.url.join("/")
                    && let Some(cached) = self.cache_match(&CacheKey::get(&root)).await
                {
                    return cached;
                }
                Response::html(200, OFFLINE_PAGE)
            }
        }
    }

    async fn default_network_first(&self, request: &Request) -> Response {
        let fetched = match self.network.fetch(request).await {
            Ok(response) if response.status == 0 => Err(Error::Network("opaque response".into())),
            other => other,
        };

        match fetched {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "fetch failed, trying cache");
                match self.cache_match(&CacheKey::for_request(request)).await {
                    Some(cached) => cached,
                    None => Response::service_unavailable(),
                }
            }
        }
    }

    async fn cache_get(&self, partition: &str, key: &CacheKey) -> Option<Response> {
        match self.store.get(partition, key).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(partition, url = %key.url, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn cache_match(&self, key: &CacheKey) -> Option<Response> {
        match self.store.match_any(key).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(url = %key.url, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store ok GET responses; everything else is left alone.
    async fn write_through(&self, partition: &str, key: &CacheKey, response: &Response) {
        if key.method != Method::Get || !response.ok() {
            return;
        }
        if let Err(err) = self.store.put(partition, key, response).await {
            tracing::warn!(partition, url = %key.url, error = %err, "cache write failed");
        }
    }
}
