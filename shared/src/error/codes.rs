//! Unified error codes for the bazaar platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Directory errors (shops, roles)
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Stock errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Request validation failed
    ValidationFailed = 2,
    /// Resource already exists
    AlreadyExists = 3,

    // ==================== 1xxx: Auth ====================
    /// Not authenticated (missing or malformed credentials)
    NotAuthenticated = 1001,
    /// Invalid email or password
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled (deactivated shop)
    AccountDisabled = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied for this operation
    PermissionDenied = 2001,

    // ==================== 3xxx: Directory ====================
    /// Shop not found
    ShopNotFound = 3001,
    /// Role does not exist
    InvalidRole = 3002,
    /// Referenced shop does not exist
    InvalidShop = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no line items
    EmptyOrder = 4002,
    /// Order is not in a cancellable state
    OrderNotCancellable = 4003,
    /// Order is not awaiting payment
    OrderNotAwaitingPayment = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Unsupported payment method
    UnsupportedPaymentMethod = 5002,

    // ==================== 6xxx: Stock ====================
    /// Stock record not found
    StockNotFound = 6001,
    /// Not enough stock available
    InsufficientStock = 6002,
    /// Invalid stock quantity
    InvalidQuantity = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database operation failed
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default human-readable message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::AlreadyExists => "Resource already exists",

            // Auth
            Self::NotAuthenticated => "Not authenticated",
            Self::InvalidCredentials => "Invalid email or password.",
            Self::TokenExpired => "Token has expired",
            Self::TokenInvalid => "Invalid token",
            Self::AccountDisabled => "This shop is deactivated. Contact support.",

            // Permission
            Self::PermissionDenied => "Permission denied",

            // Directory
            Self::ShopNotFound => "Shop not found",
            Self::InvalidRole => "Invalid role selected.",
            Self::InvalidShop => "Invalid shop selected.",

            // Order
            Self::OrderNotFound => "Order not found",
            Self::EmptyOrder => "Order must contain at least one item",
            Self::OrderNotCancellable => "Order cannot be cancelled in its current status",
            Self::OrderNotAwaitingPayment => "Order is not in pending payment status",

            // Payment
            Self::PaymentNotFound => "Payment not found",
            Self::UnsupportedPaymentMethod => "Unsupported payment method",

            // Stock
            Self::StockNotFound => "Stock record not found.",
            Self::InsufficientStock => "Not enough stock available.",
            Self::InvalidQuantity => "Invalid stock quantity.",

            // System
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database operation failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an unknown u16 value to an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::AlreadyExists),

            1001 => Ok(Self::NotAuthenticated),
            1002 => Ok(Self::InvalidCredentials),
            1003 => Ok(Self::TokenExpired),
            1004 => Ok(Self::TokenInvalid),
            1005 => Ok(Self::AccountDisabled),

            2001 => Ok(Self::PermissionDenied),

            3001 => Ok(Self::ShopNotFound),
            3002 => Ok(Self::InvalidRole),
            3003 => Ok(Self::InvalidShop),

            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::EmptyOrder),
            4003 => Ok(Self::OrderNotCancellable),
            4004 => Ok(Self::OrderNotAwaitingPayment),

            5001 => Ok(Self::PaymentNotFound),
            5002 => Ok(Self::UnsupportedPaymentMethod),

            6001 => Ok(Self::StockNotFound),
            6002 => Ok(Self::InsufficientStock),
            6003 => Ok(Self::InvalidQuantity),

            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
