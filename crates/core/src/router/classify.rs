//! Request classification.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::http::{Method, Request, RequestMode};

/// The strategy a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Non-GET: straight to the network, never cached.
    Bypass,
    /// Catalog API: network first, cached copy, then a JSON 503.
    Api,
    /// Image CDN: cache first, then network, then an empty 404.
    CdnImage,
    /// Images, scripts, styles and fonts: cache first, then network.
    StaticAsset,
    /// Page loads: network first, cached page, cached root, offline page.
    Navigation,
    /// Everything else: network first, cached copy, then a plain 503.
    Default,
}

/// Pick the route for `request`. The first matching rule wins.
pub fn classify(request: &Request, config: &AppConfig) -> Route {
    if request.method != Method::Get {
        return Route::Bypass;
    }

    let host = request.url.host_str().unwrap_or_default();
    if host.eq_ignore_ascii_case(&config.api_host) {
        return Route::Api;
    }
    if host.contains(config.image_host.as_str()) {
        return Route::CdnImage;
    }
    if request.destination.is_static_asset() {
        return Route::StaticAsset;
    }
    if request.mode == RequestMode::Navigate {
        return Route::Navigation;
    }
    Route::Default
}
