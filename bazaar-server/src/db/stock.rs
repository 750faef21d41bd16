//! StockStore implementation over PostgreSQL

use async_trait::async_trait;

use shared::models::StockChangeType;

use crate::error::{StoreError, StoreResult};

use super::{PgStore, ShopStockRow, StockAdjusted, StockHistoryRow, StockStore};

#[derive(sqlx::FromRow)]
struct ShopStockDbRow {
    stock_id: i64,
    product_id: i64,
    product_name: String,
    quantity: i32,
    last_updated: i64,
}

#[derive(sqlx::FromRow)]
struct HistoryDbRow {
    id: i64,
    stock_id: i64,
    product_id: i64,
    shop_id: i64,
    change_type: String,
    quantity_changed: i32,
    previous_quantity: i32,
    new_quantity: i32,
    changed_by: String,
    changed_at: i64,
}

#[async_trait]
impl StockStore for PgStore {
    async fn shop_stock(&self, shop_id: i64) -> StoreResult<Vec<ShopStockRow>> {
        let rows: Vec<ShopStockDbRow> = sqlx::query_as(
            r#"
            SELECT s.id AS stock_id, s.product_id, p.name AS product_name, s.quantity, s.last_updated
            FROM stock s
            JOIN products p ON p.id = s.product_id
            WHERE s.shop_id = $1 AND s.is_deleted = FALSE
            ORDER BY p.name
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ShopStockRow {
                stock_id: r.stock_id,
                product_id: r.product_id,
                product_name: r.product_name,
                quantity: r.quantity,
                last_updated: r.last_updated,
            })
            .collect())
    }

    async fn adjust(
        &self,
        stock_id: i64,
        quantity: i32,
        change: StockChangeType,
        actor: &str,
    ) -> StoreResult<StockAdjusted> {
        let now = crate::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let row: Option<(i64, i64, i32, bool)> = sqlx::query_as(
            "SELECT product_id, shop_id, quantity, is_deleted FROM stock WHERE id = $1 FOR UPDATE",
        )
        .bind(stock_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((product_id, shop_id, previous_quantity, is_deleted)) = row else {
            return Err(StoreError::StockNotFound(stock_id));
        };
        if is_deleted {
            return Err(StoreError::StockNotFound(stock_id));
        }

        let new_quantity = match change {
            StockChangeType::Add => previous_quantity + quantity,
            StockChangeType::Reduce => {
                if quantity > previous_quantity {
                    return Err(StoreError::InsufficientStock {
                        product_id,
                        requested: quantity,
                        available: previous_quantity,
                    });
                }
                previous_quantity - quantity
            }
        };

        sqlx::query("UPDATE stock SET quantity = $1, last_updated = $2 WHERE id = $3")
            .bind(new_quantity)
            .bind(now)
            .bind(stock_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO stock_history (id, stock_id, product_id, shop_id, change_type, quantity_changed, previous_quantity, new_quantity, changed_by, changed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(super::snowflake_id())
        .bind(stock_id)
        .bind(product_id)
        .bind(shop_id)
        .bind(change.as_db())
        .bind(quantity)
        .bind(previous_quantity)
        .bind(new_quantity)
        .bind(actor)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(StockAdjusted {
            stock_id,
            previous_quantity,
            new_quantity,
        })
    }

    async fn history(&self, stock_id: i64) -> StoreResult<Vec<StockHistoryRow>> {
        let rows: Vec<HistoryDbRow> = sqlx::query_as(
            r#"
            SELECT id, stock_id, product_id, shop_id, change_type, quantity_changed, previous_quantity, new_quantity, changed_by, changed_at
            FROM stock_history
            WHERE stock_id = $1
            ORDER BY changed_at DESC, id DESC
            "#,
        )
        .bind(stock_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(StockHistoryRow {
                    id: r.id,
                    stock_id: r.stock_id,
                    product_id: r.product_id,
                    shop_id: r.shop_id,
                    change_type: super::parse_change_type(&r.change_type)?,
                    quantity_changed: r.quantity_changed,
                    previous_quantity: r.previous_quantity,
                    new_quantity: r.new_quantity,
                    changed_by: r.changed_by,
                    changed_at: r.changed_at,
                })
            })
            .collect()
    }
}
