//! Scripted network for router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{Network, ServiceWorker};
use crate::Error;
use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::http::{Request, Response};

#[derive(Default)]
struct Inner {
    routes: Mutex<HashMap<String, Option<Response>>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

/// Answers from a URL table. Unknown URLs and `fail`ed URLs error out, as
/// does everything while offline. Counts every call.
#[derive(Clone, Default)]
pub(crate) struct FakeNetwork {
    inner: Arc<Inner>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serve the default precache manifest.
    pub(crate) fn with_app_shell(self) -> Self {
        for path in AppConfig::default().precache {
            let body = format!("shell {path}");
            self.respond(&format!("http://localhost:8080{path}"), Response::new(200, body));
        }
        self
    }

    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.inner.routes.lock().unwrap().insert(url.to_string(), Some(response));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.inner.routes.lock().unwrap().insert(url.to_string(), None);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn reset_calls(&self) {
        self.inner.calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let routes = self.inner.routes.lock().unwrap();
        match routes.get(request.url.as_str()) {
            Some(Some(response)) => Ok(response.clone()),
            _ => Err(Error::Network(format!("unreachable: {}", request.url))),
        }
    }
}

pub(crate) fn worker<S: CacheStore>(store: S, network: FakeNetwork) -> ServiceWorker<S, FakeNetwork> {
    ServiceWorker::new(AppConfig::default(), store, network).unwrap()
}
