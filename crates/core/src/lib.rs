//! Core types and shared functionality for the OtakuDB offline worker.
//!
//! This crate provides:
//! - The offline cache router (lifecycle state machine and fetch strategies)
//! - The notification bridge (push, scheduled messages, clicks)
//! - Cache storage: an in-memory store and a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod notify;
pub mod router;

pub use cache::{CacheDb, CacheKey, CacheStore, MemoryStore};
pub use config::{AppConfig, PartitionSet, Purpose};
pub use error::Error;
pub use http::{Destination, Method, Request, RequestMode, Response};
pub use router::{Network, Route, ServiceWorker, WorkerState};
