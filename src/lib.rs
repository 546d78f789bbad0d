//! devserve: a local development file server.
//!
//! Serves the working directory over HTTP on loopback and stamps every
//! response with CORS allow-all, cache-disabling, and cross-origin isolation
//! headers, so pages that need `SharedArrayBuffer` and friends can be tested
//! straight from disk.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
