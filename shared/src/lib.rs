//! Shared types for the bazaar platform
//!
//! Common types used across the server (and any future clients):
//! the unified error system and the domain status enums that gate
//! the order/payment/stock workflow.

pub mod error;
pub mod models;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{OrderStatus, PaymentMethod, PaymentStatus, ShippingStatus, StockChangeType};
