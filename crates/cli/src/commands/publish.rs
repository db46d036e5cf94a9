//! Publish order payloads onto the stream broker.
//!
//! Payloads are validated with the same decoder the server uses before they
//! are pushed, so a typo'd file fails here rather than being silently
//! abandoned by the ingestion pipeline.

use chrono::Utc;
use redis::AsyncCommands;
use tracing::info;
use uuid::Uuid;

use orderline_core::{Delivery, Order, OrderItem, Payment};
use orderline_server::config::ServerConfig;

/// Publish the order payload from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the payload does not decode
/// into an order aggregate, or the broker push fails.
pub async fn from_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    let payload = tokio::fs::read(path).await?;
    let order = Order::from_json(&payload)?;

    publish(&config, &order).await?;
    info!(order_id = %order.order_id, path, "Order published");
    Ok(())
}

/// Generate and publish `count` sample orders.
///
/// # Errors
///
/// Returns an error if the broker push fails.
pub async fn samples(count: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    for _ in 0..count {
        let order = sample_order();
        publish(&config, &order).await?;
        info!(order_id = %order.order_id, "Sample order published");
    }
    Ok(())
}

/// Push one order onto the stream topic.
///
/// Producers LPUSH; the server's consumer BRPOPs from the other end.
async fn publish(config: &ServerConfig, order: &Order) -> Result<(), Box<dyn std::error::Error>> {
    let client = redis::Client::open(config.stream.broker_url.as_str())?;
    let mut conn = client.get_multiplexed_async_connection().await?;

    let payload = serde_json::to_string(order)?;
    conn.lpush::<_, _, ()>(&config.stream.topic, payload).await?;

    Ok(())
}

/// A complete aggregate with a fresh unique id.
fn sample_order() -> Order {
    let id = format!("sample-{}", Uuid::new_v4().simple());
    let track_number = "WBILMTESTTRACK".to_string();

    Order {
        order_id: id.clone().into(),
        track_number: track_number.clone(),
        entry: "WBIL".to_string(),
        locale: "en".to_string(),
        customer_id: "sample-customer".to_string(),
        delivery_service: "meest".to_string(),
        created_at: Utc::now(),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction: id,
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: Utc::now().timestamp(),
            bank: "alpha".to_string(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: vec![OrderItem {
            chrt_id: 9_934_930,
            track_number,
            price: 453,
            rid: format!("rid-{}", Uuid::new_v4().simple()),
            name: "Mascaras".to_string(),
            sale: 30,
            size: "0".to_string(),
            total_price: 317,
            nm_id: 2_389_212,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
        }],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_order_roundtrips_through_decoder() {
        let order = sample_order();
        let payload = serde_json::to_vec(&order).unwrap();
        let decoded = Order::from_json(&payload).unwrap();
        assert_eq!(decoded, order);
    }

    #[test]
    fn test_sample_orders_get_unique_ids() {
        let a = sample_order();
        let b = sample_order();
        assert_ne!(a.order_id, b.order_id);
    }
}
