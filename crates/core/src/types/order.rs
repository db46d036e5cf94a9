//! The order aggregate and its embedded records.
//!
//! An order is ingested, stored, and cached as one unit: the header plus the
//! 1:1 delivery and payment records and the 1:N line items. The JSON shape
//! here is the wire format of the stream messages and of the HTTP lookup
//! responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::OrderId;

/// Error decoding a stream payload into an [`Order`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON or is missing required fields.
    #[error("malformed order payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload decoded but carries an empty `order_id`.
    #[error("order payload has an empty order_id")]
    MissingOrderId,
}

/// The complete record for one order, treated as a single unit for
/// persistence and caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Globally unique identifier; the sole lookup key.
    pub order_id: OrderId,
    pub track_number: String,
    pub entry: String,
    pub locale: String,
    pub customer_id: String,
    pub delivery_service: String,
    /// When the order was created (RFC 3339 on the wire).
    pub created_at: DateTime<Utc>,
    /// Delivery record, 1:1 with the order.
    pub delivery: Delivery,
    /// Payment record, 1:1 with the order.
    pub payment: Payment,
    /// Line items in the order they were submitted.
    pub items: Vec<OrderItem>,
}

/// Delivery details for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment details for an order. Monetary amounts are minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub transaction: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Payment timestamp, unix seconds.
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

/// One line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog id of the item variant.
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    /// Item reference id within the order.
    pub rid: String,
    pub name: String,
    /// Discount percentage applied.
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    /// Model id of the item.
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}

impl Order {
    /// Decode a stream payload into an order aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] when the payload is not valid JSON or is
    /// missing required fields, and [`DecodeError::MissingOrderId`] when the
    /// decoded aggregate has an empty identifier.
    pub fn from_json(payload: &[u8]) -> Result<Self, DecodeError> {
        let order: Self = serde_json::from_slice(payload)?;
        if order.order_id.is_empty() {
            return Err(DecodeError::MissingOrderId);
        }
        Ok(order)
    }
}
