//! Orderline Core - Shared types library.
//!
//! This crate provides the order domain types used across all Orderline
//! components:
//! - `server` - Stream-fed order service (ingestion, cache, HTTP lookup)
//! - `cli` - Command-line tools for publishing and inspecting orders
//!
//! # Architecture
//!
//! The core crate contains only types and decoding logic - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - The order aggregate, its sub-records, and the `OrderId`
//!   newtype

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
