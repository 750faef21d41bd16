//! PaymentStore implementation over PostgreSQL

use async_trait::async_trait;
use rust_decimal::Decimal;

use shared::models::{OrderStatus, PaymentStatus, ShippingStatus};

use crate::error::{StoreError, StoreResult};

use super::orders::decrement_order_stock;
use super::{CallbackApplied, PaymentContext, PaymentStatusView, PaymentStore, PgStore};

#[async_trait]
impl PaymentStore for PgStore {
    async fn payment_context(&self, order_id: i64) -> StoreResult<PaymentContext> {
        let row: Option<(String, String, Decimal)> = sqlx::query_as(
            r#"
            SELECT o.order_status, p.method, p.amount
            FROM orders o
            JOIN payments p ON p.order_id = o.id
            WHERE o.id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((order_status, method, amount)) = row else {
            return Err(StoreError::OrderNotFound(order_id));
        };

        Ok(PaymentContext {
            order_status: super::parse_order_status(&order_status)?,
            method,
            amount,
        })
    }

    async fn record_callback(
        &self,
        order_id: i64,
        success: bool,
        transaction_id: Option<String>,
    ) -> StoreResult<CallbackApplied> {
        let now = crate::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT o.order_status, p.payment_status, o.shop_id
            FROM orders o
            JOIN payments p ON p.order_id = o.id
            WHERE o.id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((order_status, payment_status, shop_id)) = row else {
            return Err(StoreError::PaymentNotFound(order_id));
        };
        let order_status = super::parse_order_status(&order_status)?;
        let payment_status = super::parse_payment_status(&payment_status)?;

        // A replayed callback on a settled payment changes nothing
        if payment_status == PaymentStatus::Paid {
            tx.commit().await?;
            return Ok(CallbackApplied {
                order_status,
                payment_status,
                already_settled: true,
            });
        }

        let new_payment_status = if success {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Failed
        };

        // The gateway outcome lands on the payment row either way
        sqlx::query(
            "UPDATE payments SET payment_status = $1, transaction_id = $2, payment_date = $3 WHERE order_id = $4",
        )
        .bind(new_payment_status.as_db())
        .bind(transaction_id.as_deref())
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        let final_order_status = if success && order_status.is_awaiting_payment() {
            sqlx::query(
                "UPDATE orders SET order_status = $1, payment_status = $2, updated_at = $3 WHERE id = $4",
            )
            .bind(OrderStatus::Confirmed.as_db())
            .bind(new_payment_status.as_db())
            .bind(now)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE shipping_details SET shipping_status = $1 WHERE order_id = $2")
                .bind(ShippingStatus::Pending.as_db())
                .bind(order_id)
                .execute(&mut *tx)
                .await?;

            decrement_order_stock(&mut tx, order_id, shop_id, now).await?;
            OrderStatus::Confirmed
        } else {
            // Failure, or a success on an order past the payment wait:
            // mirror the payment status and leave the order where it is
            sqlx::query("UPDATE orders SET payment_status = $1, updated_at = $2 WHERE id = $3")
                .bind(new_payment_status.as_db())
                .bind(now)
                .bind(order_id)
                .execute(&mut *tx)
                .await?;
            order_status
        };

        tx.commit().await?;
        Ok(CallbackApplied {
            order_status: final_order_status,
            payment_status: new_payment_status,
            already_settled: false,
        })
    }

    async fn status_view(&self, order_id: i64) -> StoreResult<PaymentStatusView> {
        let row: Option<(String, Option<String>, Option<i64>, String)> = sqlx::query_as(
            r#"
            SELECT p.payment_status, p.transaction_id, p.payment_date, o.order_status
            FROM payments p
            JOIN orders o ON o.id = p.order_id
            WHERE p.order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((payment_status, transaction_id, payment_date, order_status)) = row else {
            return Err(StoreError::PaymentNotFound(order_id));
        };

        Ok(PaymentStatusView {
            order_id,
            payment_status: super::parse_payment_status(&payment_status)?,
            transaction_id,
            payment_date,
            order_status: super::parse_order_status(&order_status)?,
        })
    }
}
