//! OrderStore implementation over PostgreSQL

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgConnection;

use shared::models::{OrderStatus, PaymentStatus, ShippingStatus};

use crate::error::{StoreError, StoreResult};

use super::{
    CancelApplied, NewOrder, OrderAggregate, OrderItemRow, OrderRow, OrderStore, PaymentRow,
    PgStore, ShippingRow, StatusChange,
};

#[derive(sqlx::FromRow)]
struct OrderDbRow {
    id: i64,
    shop_id: i64,
    customer_id: Option<i64>,
    total_amount: Decimal,
    order_status: String,
    payment_status: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct ShippingDbRow {
    full_name: String,
    email: Option<String>,
    phone: String,
    address: String,
    city: String,
    province: String,
    postal_code: String,
    shipping_status: String,
}

#[derive(sqlx::FromRow)]
struct PaymentDbRow {
    method: String,
    amount: Decimal,
    payment_status: String,
    transaction_id: Option<String>,
    payment_date: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct ItemDbRow {
    product_id: i64,
    product_name: String,
    quantity: i32,
    price: Decimal,
    total: Decimal,
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create(&self, order: NewOrder) -> StoreResult<i64> {
        let now = crate::util::now_millis();
        let mut tx = self.pool.begin().await?;

        // Shop must exist and be live
        let shop: Option<(bool,)> = sqlx::query_as("SELECT is_deleted FROM shops WHERE id = $1")
            .bind(order.shop_id)
            .fetch_optional(&mut *tx)
            .await?;
        if !matches!(shop, Some((false,))) {
            return Err(StoreError::ShopNotFound(order.shop_id));
        }

        let order_id = super::snowflake_id();
        sqlx::query(
            r#"
            INSERT INTO orders (id, shop_id, customer_id, total_amount, order_status, payment_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(order_id)
        .bind(order.shop_id)
        .bind(order.customer_id)
        .bind(order.total_amount)
        .bind(order.order_status.as_db())
        .bind(order.payment_status.as_db())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let detail_ids: Vec<i64> = order.items.iter().map(|_| super::snowflake_id()).collect();
        let order_ids: Vec<i64> = order.items.iter().map(|_| order_id).collect();
        let product_ids: Vec<i64> = order.items.iter().map(|i| i.product_id).collect();
        let product_names: Vec<String> = order
            .items
            .iter()
            .map(|i| i.product_name.clone())
            .collect();
        let quantities: Vec<i32> = order.items.iter().map(|i| i.quantity).collect();
        let prices: Vec<Decimal> = order.items.iter().map(|i| i.price).collect();
        let totals: Vec<Decimal> = order
            .items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .collect();
        sqlx::query(
            r#"
            INSERT INTO order_details (id, order_id, product_id, product_name, quantity, price, total)
            SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[], $4::text[], $5::integer[], $6::numeric[], $7::numeric[])
            "#,
        )
        .bind(&detail_ids)
        .bind(&order_ids)
        .bind(&product_ids)
        .bind(&product_names)
        .bind(&quantities)
        .bind(&prices)
        .bind(&totals)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO shipping_details (order_id, full_name, email, phone, address, city, province, postal_code, shipping_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order_id)
        .bind(&order.full_name)
        .bind(&order.email)
        .bind(&order.phone)
        .bind(&order.address)
        .bind(&order.city)
        .bind(&order.province)
        .bind(&order.postal_code)
        .bind(ShippingStatus::Pending.as_db())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO payments (order_id, method, amount, payment_status) VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(order.method.as_db())
        .bind(order.total_amount)
        .bind(order.payment_status.as_db())
        .execute(&mut *tx)
        .await?;

        // Cash on delivery reserves stock up front; a shortfall rolls the
        // whole order back
        if order.decrement_stock {
            decrement_order_stock(&mut tx, order_id, order.shop_id, now).await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    async fn load(&self, order_id: i64) -> StoreResult<OrderAggregate> {
        let row: Option<OrderDbRow> = sqlx::query_as(
            "SELECT id, shop_id, customer_id, total_amount, order_status, payment_status, created_at, updated_at FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Err(StoreError::OrderNotFound(order_id));
        };

        let shipping: ShippingDbRow = sqlx::query_as(
            "SELECT full_name, email, phone, address, city, province, postal_code, shipping_status FROM shipping_details WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        let payment: PaymentDbRow = sqlx::query_as(
            "SELECT method, amount, payment_status, transaction_id, payment_date FROM payments WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        let items: Vec<ItemDbRow> = sqlx::query_as(
            "SELECT product_id, product_name, quantity, price, total FROM order_details WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OrderAggregate {
            order: OrderRow {
                id: row.id,
                shop_id: row.shop_id,
                customer_id: row.customer_id,
                total_amount: row.total_amount,
                order_status: super::parse_order_status(&row.order_status)?,
                payment_status: super::parse_payment_status(&row.payment_status)?,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            shipping: ShippingRow {
                full_name: shipping.full_name,
                email: shipping.email,
                phone: shipping.phone,
                address: shipping.address,
                city: shipping.city,
                province: shipping.province,
                postal_code: shipping.postal_code,
                shipping_status: super::parse_shipping_status(&shipping.shipping_status)?,
            },
            payment: PaymentRow {
                method: payment.method,
                amount: payment.amount,
                payment_status: super::parse_payment_status(&payment.payment_status)?,
                transaction_id: payment.transaction_id,
                payment_date: payment.payment_date,
            },
            items: items
                .into_iter()
                .map(|i| OrderItemRow {
                    product_id: i.product_id,
                    product_name: i.product_name,
                    quantity: i.quantity,
                    price: i.price,
                    total: i.total,
                })
                .collect(),
        })
    }

    async fn update_status(&self, order_id: i64, change: StatusChange) -> StoreResult<()> {
        let now = crate::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let current: Option<(String, i64)> =
            sqlx::query_as("SELECT order_status, shop_id FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((current_status, shop_id)) = current else {
            return Err(StoreError::OrderNotFound(order_id));
        };
        let current_status = super::parse_order_status(&current_status)?;

        sqlx::query(
            "UPDATE orders SET order_status = $1, payment_status = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(change.order_status.as_db())
        .bind(change.payment_status.as_db())
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        // Mirror onto the payment row; payment_date is written once, when
        // the payment first turns paid
        sqlx::query(
            r#"
            UPDATE payments
            SET payment_status = $1,
                transaction_id = COALESCE($2, transaction_id),
                payment_date = CASE WHEN $1 = 'paid' AND payment_date IS NULL THEN $3 ELSE payment_date END
            WHERE order_id = $4
            "#,
        )
        .bind(change.payment_status.as_db())
        .bind(change.transaction_id.as_deref())
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        if change.order_status == OrderStatus::Confirmed {
            sqlx::query("UPDATE shipping_details SET shipping_status = $1 WHERE order_id = $2")
                .bind(ShippingStatus::Pending.as_db())
                .bind(order_id)
                .execute(&mut *tx)
                .await?;

            // The deferred decrement runs exactly once, on the transition
            // out of pending_payment
            if current_status.is_awaiting_payment() {
                decrement_order_stock(&mut tx, order_id, shop_id, now).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn cancel(
        &self,
        order_id: i64,
        restock_if_confirmed: bool,
    ) -> StoreResult<CancelApplied> {
        let now = crate::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let current: Option<(String, i64)> =
            sqlx::query_as("SELECT order_status, shop_id FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((previous, shop_id)) = current else {
            return Err(StoreError::OrderNotFound(order_id));
        };
        let previous = super::parse_order_status(&previous)?;
        if !previous.is_cancellable() {
            return Err(StoreError::NotCancellable {
                order_id,
                status: previous,
            });
        }

        sqlx::query(
            "UPDATE orders SET order_status = $1, payment_status = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(OrderStatus::Cancelled.as_db())
        .bind(PaymentStatus::Refunded.as_db())
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE payments SET payment_status = $1 WHERE order_id = $2")
            .bind(PaymentStatus::Refunded.as_db())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        // Only confirmed orders have had stock taken on the prepaid path
        let restocked = restock_if_confirmed && previous == OrderStatus::Confirmed;
        if restocked {
            restock_order_stock(&mut tx, order_id, shop_id, now).await?;
        }

        tx.commit().await?;
        Ok(CancelApplied {
            previous_status: previous,
            restocked,
        })
    }
}

/// Decrement shop stock by the order's grouped line quantities.
///
/// Locks the matching stock rows, checks sufficiency (a missing row counts
/// as zero available), then applies one grouped UPDATE. Runs inside the
/// caller's transaction so a shortfall rolls everything back.
pub(super) async fn decrement_order_stock(
    conn: &mut PgConnection,
    order_id: i64,
    shop_id: i64,
    now: i64,
) -> StoreResult<()> {
    let lines: Vec<(i64, i32)> = sqlx::query_as(
        "SELECT product_id, SUM(quantity)::int FROM order_details WHERE order_id = $1 GROUP BY product_id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    if lines.is_empty() {
        return Ok(());
    }

    let product_ids: Vec<i64> = lines.iter().map(|(pid, _)| *pid).collect();
    let available: Vec<(i64, i32)> = sqlx::query_as(
        "SELECT product_id, quantity FROM stock WHERE shop_id = $1 AND product_id = ANY($2) AND is_deleted = FALSE FOR UPDATE",
    )
    .bind(shop_id)
    .bind(&product_ids)
    .fetch_all(&mut *conn)
    .await?;

    for (product_id, requested) in &lines {
        let on_hand = available
            .iter()
            .find(|(pid, _)| pid == product_id)
            .map(|(_, q)| *q)
            .unwrap_or(0);
        if on_hand < *requested {
            return Err(StoreError::InsufficientStock {
                product_id: *product_id,
                requested: *requested,
                available: on_hand,
            });
        }
    }

    sqlx::query(
        r#"
        UPDATE stock s
        SET quantity = s.quantity - d.qty, last_updated = $3
        FROM (
            SELECT product_id, SUM(quantity)::int AS qty
            FROM order_details
            WHERE order_id = $1
            GROUP BY product_id
        ) d
        WHERE s.product_id = d.product_id AND s.shop_id = $2 AND s.is_deleted = FALSE
        "#,
    )
    .bind(order_id)
    .bind(shop_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Return the order's grouped line quantities to shop stock. Stock rows
/// that no longer exist are skipped; there is nowhere to put them back.
pub(super) async fn restock_order_stock(
    conn: &mut PgConnection,
    order_id: i64,
    shop_id: i64,
    now: i64,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        UPDATE stock s
        SET quantity = s.quantity + d.qty, last_updated = $3
        FROM (
            SELECT product_id, SUM(quantity)::int AS qty
            FROM order_details
            WHERE order_id = $1
            GROUP BY product_id
        ) d
        WHERE s.product_id = d.product_id AND s.shop_id = $2 AND s.is_deleted = FALSE
        "#,
    )
    .bind(order_id)
    .bind(shop_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
