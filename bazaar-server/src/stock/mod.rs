//! Stock ledger for the back office.
//!
//! Manual quantity changes go through here so every movement lands in
//! the history table with who did it and what the level was before.
//! Order-driven movements bypass the ledger; they live inside the order
//! transactions.

use std::sync::Arc;

use shared::{AppError, AppResult, ErrorCode, StockChangeType};

use crate::db::{ShopStockRow, StockAdjusted, StockHistoryRow, StockStore};

#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn StockStore>,
}

impl StockLedger {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self { store }
    }

    /// Current stock rows for a shop, alphabetical by product name.
    pub async fn shop_stock(&self, shop_id: i64) -> AppResult<Vec<ShopStockRow>> {
        let rows = self.store.shop_stock(shop_id).await?;
        if rows.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::StockNotFound,
                "No stock found for this shop.",
            ));
        }
        Ok(rows)
    }

    /// Apply a manual quantity change and record it in the history.
    pub async fn adjust(
        &self,
        stock_id: i64,
        quantity: i32,
        change: StockChangeType,
        actor: &str,
    ) -> AppResult<StockAdjusted> {
        if quantity <= 0 {
            return Err(AppError::new(ErrorCode::InvalidQuantity));
        }

        let adjusted = self
            .store
            .adjust(stock_id, quantity, change.clone(), actor)
            .await?;
        tracing::info!(
            stock_id,
            change = %change,
            quantity,
            new_quantity = adjusted.new_quantity,
            actor,
            "Stock adjusted"
        );
        Ok(adjusted)
    }

    /// Movement history for one stock row, newest first.
    pub async fn history(&self, stock_id: i64) -> AppResult<Vec<StockHistoryRow>> {
        let rows = self.store.history(stock_id).await?;
        if rows.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::StockNotFound,
                "No history found for this stock.",
            ));
        }
        Ok(rows)
    }
}
