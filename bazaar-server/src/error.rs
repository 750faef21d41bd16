//! Unified storage-layer error type for bazaar-server
//!
//! `StoreError` bridges the gap between storage-layer errors (`sqlx::Error`,
//! domain lookups) and the API-layer error (`AppError`). It enables `?`
//! propagation without manual `.map_err(|e| { tracing::error!(...); ... })`
//! boilerplate in the workflow and handlers.

use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

/// Storage-layer error
///
/// Domain variants map to their business error codes; `Database` covers
/// infrastructure failures (auto-logged, mapped to DatabaseError).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("payment for order {0} not found")]
    PaymentNotFound(i64),

    #[error("stock record {0} not found")]
    StockNotFound(i64),

    #[error("shop {0} not found")]
    ShopNotFound(i64),

    #[error("order {order_id} cannot be cancelled from status {status}")]
    NotCancellable { order_id: i64, status: OrderStatus },

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(_) => AppError::new(ErrorCode::OrderNotFound),
            StoreError::PaymentNotFound(_) => AppError::new(ErrorCode::PaymentNotFound),
            StoreError::StockNotFound(_) => AppError::new(ErrorCode::StockNotFound),
            StoreError::ShopNotFound(_) => AppError::new(ErrorCode::ShopNotFound),
            StoreError::NotCancellable { status, .. } => {
                AppError::new(ErrorCode::OrderNotCancellable)
                    .with_detail("orderStatus", status.as_db())
            }
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::new(ErrorCode::InsufficientStock)
                .with_detail("productId", product_id)
                .with_detail("requested", requested)
                .with_detail("available", available),
            StoreError::Database(msg) => {
                tracing::error!(error = %msg, "Storage error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

/// Convenience type alias for storage-layer results
pub type StoreResult<T> = Result<T, StoreError>;
