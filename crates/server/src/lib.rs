//! Orderline Server - stream-fed order lookup service.
//!
//! # Architecture
//!
//! - An ingestion pipeline consumes JSON order messages from the stream
//!   broker, persists each aggregate to `PostgreSQL` in one transaction, and
//!   only then publishes it into the in-memory order cache
//! - The HTTP lookup path answers `GET /order/{id}` from the cache alone;
//!   a miss is authoritative for "currently unknown to this process"
//! - At startup the cache is warm-loaded from the database before the
//!   listener accepts traffic
//!
//! The binary lives in `main.rs`; this library exposes the building blocks
//! so the CLI and tests can reuse them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod routes;
pub mod state;
