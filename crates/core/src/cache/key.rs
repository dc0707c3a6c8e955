//! Cache keys: normalized method + URL.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::{Method, Request};

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string so equivalent requests share one cache entry.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Lowercase the host
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Identity of a cached entry.
///
/// The query string is part of the key, so `?page=1` and `?page=2` are
/// distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheKey {
    pub method: Method,
    pub url: String,
}

impl CacheKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method, url: url.into() }
    }

    pub fn get(url: &Url) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn parse(method: Method, url: &str) -> Result<Self, UrlError> {
        Ok(Self::new(method, &canonicalize(url)?))
    }

    pub fn for_request(request: &Request) -> Self {
        Self::new(request.method, &request.url)
    }

    /// Stable storage digest, see [`super::hash::key_digest`].
    pub fn digest(&self) -> String {
        super::hash::key_digest(self.method.as_str(), &self.url)
    }
}
