//! Stream broker input.
//!
//! Orders arrive as JSON payloads on one broker topic. Producers `LPUSH`
//! onto the list key; this consumer `BRPOP`s from the other end, so each
//! message is delivered to exactly one consumer of the topic.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use thiserror::Error;

use crate::config::StreamConfig;

/// Errors reading from the stream broker.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Broker connection could not be established or was lost.
    #[error("broker connection error: {0}")]
    Connection(#[from] redis::RedisError),
}

/// A source of raw order message payloads.
///
/// `Ok(None)` means the poll timed out with no message available; the
/// caller is expected to poll again.
#[async_trait]
pub trait MessageStream: Send {
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>, StreamError>;
}

/// Blocking-pop consumer over a Redis list.
///
/// The connection is established lazily and dropped on error, so the next
/// poll reconnects instead of failing forever.
pub struct RedisStream {
    client: redis::Client,
    topic: String,
    poll_timeout: Duration,
    conn: Option<MultiplexedConnection>,
}

impl RedisStream {
    /// Create a consumer for the configured broker and topic.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Connection` if the broker URL is invalid. No
    /// network I/O happens until the first poll.
    pub fn connect(config: &StreamConfig) -> Result<Self, StreamError> {
        let client = redis::Client::open(config.broker_url.as_str())?;
        Ok(Self {
            client,
            topic: config.topic.clone(),
            poll_timeout: config.poll_timeout,
            conn: None,
        })
    }

    async fn connection(&mut self) -> Result<&mut MultiplexedConnection, StreamError> {
        match self.conn {
            Some(ref mut conn) => Ok(conn),
            None => {
                let conn = self.client.get_multiplexed_async_connection().await?;
                tracing::debug!(topic = %self.topic, "Connected to stream broker");
                Ok(self.conn.insert(conn))
            }
        }
    }
}

#[async_trait]
impl MessageStream for RedisStream {
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        let topic = self.topic.clone();
        let timeout = self.poll_timeout.as_secs_f64();

        let conn = self.connection().await?;
        let popped: Result<Option<(String, Vec<u8>)>, redis::RedisError> =
            conn.brpop(&topic, timeout).await;

        match popped {
            Ok(Some((_key, payload))) => Ok(Some(payload)),
            Ok(None) => Ok(None),
            Err(e) => {
                // Force a reconnect on the next poll.
                self.conn = None;
                Err(StreamError::Connection(e))
            }
        }
    }
}
