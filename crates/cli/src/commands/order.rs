//! Direct storage lookup for one order.
//!
//! Diagnostics path: bypasses the service's cache and asks the database, so
//! an operator can tell "not ingested" apart from "not yet cache-visible".

use orderline_core::OrderId;
use orderline_server::config::ServerConfig;
use orderline_server::db::{self, OrderStore, PgOrderStore};

/// Fetch one order straight from the database and print it as JSON.
///
/// # Errors
///
/// Returns an error if the database is unreachable, the query fails, or the
/// order does not exist.
#[allow(clippy::print_stdout)]
pub async fn show(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    let store = PgOrderStore::new(pool);

    let order_id = OrderId::from(id);
    match store.get_order(&order_id).await? {
        Some(order) => {
            println!("{}", serde_json::to_string_pretty(&order)?);
            Ok(())
        }
        None => Err(format!("order {id} not found in storage").into()),
    }
}
