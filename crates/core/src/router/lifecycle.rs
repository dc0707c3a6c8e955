//! Install and activate transitions.

use serde::{Deserialize, Serialize};

use super::{Network, ServiceWorker, WorkerState};
use crate::Error;
use crate::cache::{CacheKey, CacheStore};
use crate::config::Purpose;
use crate::http::{Method, Request};

/// What activation cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivationReport {
    /// Partitions from other versions that were deleted.
    pub deleted_partitions: Vec<String>,
    /// API entries removed by the stale-origin purge.
    pub purged_entries: Vec<String>,
    /// Open pages taken under control.
    pub claimed_clients: usize,
}

impl<S: CacheStore, N: Network> ServiceWorker<S, N> {
    /// Precache the app shell into the static partition.
    ///
    /// Every manifest path is fetched before anything is stored; one failed
    /// or non-ok fetch fails the whole install, leaves the cache untouched and
    /// marks the worker `Redundant`.
    pub async fn install(&self) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            if !matches!(*state, WorkerState::Parsed | WorkerState::Redundant) {
                return Err(Error::InvalidState(format!("cannot install while {}", *state)));
            }
            *state = WorkerState::Installing;
        }
        tracing::info!(version = %self.config.cache_version, "installing worker");

        match self.precache().await {
            Ok(count) => {
                tracing::info!(count, partition = self.partitions.name(Purpose::Static), "precache complete");
                self.set_state(WorkerState::Installed).await;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "install failed");
                self.set_state(WorkerState::Redundant).await;
                Err(err)
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let partition = self.partitions.name(Purpose::Static);
        self.store.open(partition).await?;

        let mut entries = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            let url = self
                .origin
                .join(path)
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            let request = Request::new(Method::Get, url);
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            if !response.ok() {
                return Err(Error::InstallFailed(format!("{path}: status {}", response.status)));
            }
            entries.push((CacheKey::for_request(&request), response));
        }

        let count = entries.len();
        self.store
            .put_all(partition, entries)
            .await
            .map_err(|e| Error::InstallFailed(e.to_string()))?;
        Ok(count)
    }

    /// Take control: drop old partitions, purge stale-origin API entries,
    /// then claim every open page. The steps run in that order.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        {
            let mut state = self.state.write().await;
            if *state != WorkerState::Installed {
                return Err(Error::InvalidState(format!("cannot activate while {}", *state)));
            }
            *state = WorkerState::Activating;
        }

        let mut report = ActivationReport::default();

        for name in self.store.partitions().await? {
            if !self.partitions.is_current(&name) && self.store.delete_partition(&name).await? {
                tracing::info!(partition = %name, "deleted outdated partition");
                report.deleted_partitions.push(name);
            }
        }

        let api = self.partitions.name(Purpose::Api);
        for key in self.store.keys(api).await? {
            if self
                .config
                .stale_origin_markers
                .iter()
                .any(|marker| key.url.contains(marker.as_str()))
                && self.store.delete(api, &key).await?
            {
                tracing::debug!(url = %key.url, "purged stale-origin entry");
                report.purged_entries.push(key.url);
            }
        }
        if !report.purged_entries.is_empty() {
            tracing::info!(count = report.purged_entries.len(), partition = api, "stale-origin purge");
        }

        report.claimed_clients = self.clients.claim().await?;

        self.set_state(WorkerState::Activated).await;
        Ok(report)
    }
}
