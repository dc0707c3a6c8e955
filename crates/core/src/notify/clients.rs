//! Open page instances the worker can focus, navigate or open.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Error;

/// One open window of the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
    pub focused: bool,
    /// Whether the worker controls this window.
    pub controlled: bool,
}

#[async_trait::async_trait]
pub trait Clients: Send + Sync {
    /// All open windows, in opening order.
    async fn match_windows(&self) -> Vec<WindowClient>;

    async fn focus(&self, id: &str) -> Result<(), Error>;

    async fn navigate(&self, id: &str, url: &str) -> Result<(), Error>;

    async fn open_window(&self, url: &str) -> Result<WindowClient, Error>;

    /// Take control of every open window. Returns how many were claimed.
    async fn claim(&self) -> Result<usize, Error>;
}

/// Window registry kept in memory.
#[derive(Clone, Default)]
pub struct MemoryClients {
    windows: Arc<RwLock<Vec<WindowClient>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryClients {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unknown(id: &str) -> Error {
    Error::InvalidInput(format!("unknown client: {id}"))
}

#[async_trait::async_trait]
impl Clients for MemoryClients {
    async fn match_windows(&self) -> Vec<WindowClient> {
        self.windows.read().await.clone()
    }

    async fn focus(&self, id: &str) -> Result<(), Error> {
        let mut windows = self.windows.write().await;
        if !windows.iter().any(|w| w.id == id) {
            return Err(unknown(id));
        }
        for window in windows.iter_mut() {
            window.focused = window.id == id;
        }
        Ok(())
    }

    async fn navigate(&self, id: &str, url: &str) -> Result<(), Error> {
        let mut windows = self.windows.write().await;
        let window = windows.iter_mut().find(|w| w.id == id).ok_or_else(|| unknown(id))?;
        window.url = url.to_string();
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<WindowClient, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut windows = self.windows.write().await;
        for window in windows.iter_mut() {
            window.focused = false;
        }
        let window = WindowClient { id: format!("window-{id}"), url: url.to_string(), focused: true, controlled: false };
        windows.push(window.clone());
        Ok(window)
    }

    async fn claim(&self) -> Result<usize, Error> {
        let mut windows = self.windows.write().await;
        let mut claimed = 0;
        for window in windows.iter_mut().filter(|w| !w.controlled) {
            window.controlled = true;
            claimed += 1;
        }
        Ok(claimed)
    }
}
