//! `PostgreSQL` order store.
//!
//! Queries use the runtime sqlx API with explicit row mapping; the insert
//! wraps all four record groups in one transaction so a failure part-way
//! through rolls everything back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use orderline_core::{Delivery, Order, OrderId, OrderItem, Payment};

use super::{OrderStore, RepositoryError};

/// Order store backed by a `PostgreSQL` connection pool.
///
/// Cheaply cloneable; the pool is internally reference-counted.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

const SELECT_AGGREGATE: &str = r"
    SELECT o.order_id, o.track_number, o.entry, o.locale, o.customer_id,
           o.delivery_service, o.created_at,
           d.name, d.phone, d.zip, d.city, d.address, d.region, d.email,
           p.transaction, p.currency, p.provider, p.amount, p.payment_dt,
           p.bank, p.delivery_cost, p.goods_total, p.custom_fee
    FROM orders o
    JOIN deliveries d ON o.order_id = d.order_id
    JOIN payments   p ON o.order_id = p.order_id
";

const SELECT_ITEMS: &str = r"
    SELECT order_id, chrt_id, track_number, price, rid, name, sale, size,
           total_price, nm_id, brand, status
    FROM order_items
";

impl PgOrderStore {
    /// Create a new order store over an established pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn get_all_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(SELECT_AGGREGATE).fetch_all(&self.pool).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(order_from_row(row)?);
        }

        // One pass over all items instead of a per-order query; the serial
        // id keeps items in submission order within each order.
        let item_rows = sqlx::query(&format!("{SELECT_ITEMS} ORDER BY order_id, id"))
            .fetch_all(&self.pool)
            .await?;

        let mut items_by_order: std::collections::HashMap<String, Vec<OrderItem>> =
            std::collections::HashMap::new();
        for row in &item_rows {
            let order_id: String = row.try_get("order_id")?;
            items_by_order
                .entry(order_id)
                .or_default()
                .push(item_from_row(row)?);
        }

        for order in &mut orders {
            if let Some(items) = items_by_order.remove(order.order_id.as_str()) {
                order.items = items;
            }
        }

        Ok(orders)
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_AGGREGATE} WHERE o.order_id = $1"))
            .bind(order_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut order = order_from_row(&row)?;

        let item_rows = sqlx::query(&format!("{SELECT_ITEMS} WHERE order_id = $1 ORDER BY id"))
            .bind(order_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        order.items = item_rows
            .iter()
            .map(item_from_row)
            .collect::<Result<_, _>>()?;

        Ok(Some(order))
    }

    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO orders (order_id, track_number, entry, locale, customer_id,
                                delivery_service, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(order.order_id.as_str())
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "order {} already exists",
                    order.order_id
                ));
            }
            RepositoryError::Database(e)
        })?;

        sqlx::query(
            r"
            INSERT INTO deliveries (order_id, name, phone, zip, city, address, region, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(order.order_id.as_str())
        .bind(&order.delivery.name)
        .bind(&order.delivery.phone)
        .bind(&order.delivery.zip)
        .bind(&order.delivery.city)
        .bind(&order.delivery.address)
        .bind(&order.delivery.region)
        .bind(&order.delivery.email)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO payments (order_id, transaction, currency, provider, amount,
                                  payment_dt, bank, delivery_cost, goods_total, custom_fee)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(order.order_id.as_str())
        .bind(&order.payment.transaction)
        .bind(&order.payment.currency)
        .bind(&order.payment.provider)
        .bind(order.payment.amount)
        .bind(order.payment.payment_dt)
        .bind(&order.payment.bank)
        .bind(order.payment.delivery_cost)
        .bind(order.payment.goods_total)
        .bind(order.payment.custom_fee)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, chrt_id, track_number, price, rid,
                                         name, sale, size, total_price, nm_id, brand, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ",
            )
            .bind(order.order_id.as_str())
            .bind(item.chrt_id)
            .bind(&item.track_number)
            .bind(item.price)
            .bind(&item.rid)
            .bind(&item.name)
            .bind(item.sale)
            .bind(&item.size)
            .bind(item.total_price)
            .bind(item.nm_id)
            .bind(&item.brand)
            .bind(item.status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, RepositoryError> {
    let order_id = OrderId::new(row.try_get("order_id")?);
    if order_id.is_empty() {
        return Err(RepositoryError::DataCorruption(
            "empty order_id in orders table".to_string(),
        ));
    }

    Ok(Order {
        order_id,
        track_number: row.try_get("track_number")?,
        entry: row.try_get("entry")?,
        locale: row.try_get("locale")?,
        customer_id: row.try_get("customer_id")?,
        delivery_service: row.try_get("delivery_service")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        delivery: Delivery {
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            zip: row.try_get("zip")?,
            city: row.try_get("city")?,
            address: row.try_get("address")?,
            region: row.try_get("region")?,
            email: row.try_get("email")?,
        },
        payment: Payment {
            transaction: row.try_get("transaction")?,
            currency: row.try_get("currency")?,
            provider: row.try_get("provider")?,
            amount: row.try_get("amount")?,
            payment_dt: row.try_get("payment_dt")?,
            bank: row.try_get("bank")?,
            delivery_cost: row.try_get("delivery_cost")?,
            goods_total: row.try_get("goods_total")?,
            custom_fee: row.try_get("custom_fee")?,
        },
        items: Vec::new(),
    })
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, RepositoryError> {
    Ok(OrderItem {
        chrt_id: row.try_get("chrt_id")?,
        track_number: row.try_get("track_number")?,
        price: row.try_get("price")?,
        rid: row.try_get("rid")?,
        name: row.try_get("name")?,
        sale: row.try_get("sale")?,
        size: row.try_get("size")?,
        total_price: row.try_get("total_price")?,
        nm_id: row.try_get("nm_id")?,
        brand: row.try_get("brand")?,
        status: row.try_get("status")?,
    })
}
