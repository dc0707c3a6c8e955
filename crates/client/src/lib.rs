//! Network transport for the OtakuDB offline worker.
//!
//! This crate provides the reqwest-backed implementation of the router's
//! `Network` trait used by the server.

pub mod fetch;

pub use fetch::{FetchConfig, FetchError, HttpNetwork};
