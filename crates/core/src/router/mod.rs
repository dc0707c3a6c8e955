//! Offline cache router.
//!
//! ### Lifecycle
//! `Parsed -> Installing -> Installed -> Activating -> Activated`. A failed
//! install ends in `Redundant`. Install precaches the app shell atomically;
//! activation drops partitions from older versions, purges stale-origin API
//! entries and claims open pages.
//!
//! ### Routing
//! Each request is classified once ([`classify`]) and handled by exactly one
//! strategy. Every strategy ends in a well-formed response, except non-GET
//! passthrough and static-asset misses, whose network errors propagate.
//!
//! ### Events
//! Push payloads, page messages and notification clicks go through the
//! notification bridge (see [`crate::notify`]).

pub mod bridge;
pub mod classify;
pub mod lifecycle;
pub mod offline;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

pub use classify::{Route, classify};
pub use lifecycle::ActivationReport;

use crate::cache::CacheStore;
use crate::config::{AppConfig, PartitionSet};
use crate::http::{Request, Response};
use crate::notify::{Clients, MemoryClients, MemoryNotifications, NotificationCenter};
use crate::Error;

/// Transport used for every outbound request.
///
/// A response with any status is a successful fetch; `Err` means no response
/// was produced at all.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[async_trait::async_trait]
impl<T: Network + ?Sized> Network for Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// One router instance bound to a configuration, a cache store and a network.
pub struct ServiceWorker<S, N> {
    config: AppConfig,
    partitions: PartitionSet,
    origin: Url,
    store: S,
    network: N,
    notifications: Arc<dyn NotificationCenter>,
    clients: Arc<dyn Clients>,
    state: RwLock<WorkerState>,
}

impl<S: CacheStore, N: Network> ServiceWorker<S, N> {
    /// Create a worker in the `Parsed` state with in-memory notification and
    /// client registries.
    pub fn new(config: AppConfig, store: S, network: N) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        Ok(Self {
            partitions: config.partitions(),
            config,
            origin,
            store,
            network,
            notifications: Arc::new(MemoryNotifications::new()),
            clients: Arc::new(MemoryClients::new()),
            state: RwLock::new(WorkerState::Parsed),
        })
    }

    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationCenter>) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn with_clients(mut self, clients: Arc<dyn Clients>) -> Self {
        self.clients = clients;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.partitions
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifications(&self) -> &Arc<dyn NotificationCenter> {
        &self.notifications
    }

    pub fn clients(&self) -> &Arc<dyn Clients> {
        &self.clients
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// The route `request` would take, without handling it.
    pub fn route(&self, request: &Request) -> Route {
        classify(request, &self.config)
    }

    /// Install, then activate without waiting for older instances.
    pub async fn start(&self) -> Result<ActivationReport, Error> {
        self.install().await?;
        self.activate().await
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        tracing::info!(from = %*state, to = %next, "worker state change");
        *state = next;
    }
}
