//! Domain types for the order aggregate.

mod id;
mod order;

pub use id::OrderId;
pub use order::{DecodeError, Delivery, Order, OrderItem, Payment};
