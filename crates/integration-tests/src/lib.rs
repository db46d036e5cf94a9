//! Integration tests for Orderline.
//!
//! # Running Tests
//!
//! The tests exercise a running stack and are `#[ignore]`d by default:
//!
//! ```bash
//! # Start PostgreSQL and the stream broker, apply crates/server/schema.sql,
//! # then run the server
//! cargo run -p orderline-server
//!
//! # Run integration tests against it
//! cargo test -p orderline-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `ORDERLINE_BASE_URL` - Server base URL (default: http://localhost:8080)
//! - `ORDERLINE_BROKER_URL` - Broker URL (default: redis://127.0.0.1:6379)
//! - `ORDERLINE_STREAM_TOPIC` - Stream topic (default: orders)
//!
//! # Test Categories
//!
//! - `order_flow` - Publish-to-lookup round trips and 404 behavior
