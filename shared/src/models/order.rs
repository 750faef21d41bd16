//! Order lifecycle enums

use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// Prepaid orders start at `PendingPayment` and move to `Confirmed` once the
/// gateway callback (or a manual status update) lands. Cash-on-delivery
/// orders skip the payment wait and start at `Processing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Prepaid order awaiting gateway confirmation
    PendingPayment,
    /// Cash-on-delivery order accepted, stock already reserved
    Processing,
    /// Payment settled (or cod confirmed), ready for fulfilment
    Confirmed,
    /// Handed over to the customer
    Delivered,
    /// Cancelled before fulfilment
    Cancelled,
}

impl OrderStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(Self::PendingPayment),
            "processing" => Some(Self::Processing),
            "confirmed" => Some(Self::Confirmed),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Processing => "processing",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Can this order still be cancelled?
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::PendingPayment | Self::Confirmed)
    }

    /// Is this order still waiting for a payment to settle?
    ///
    /// Gates the deferred stock decrement: confirming an order decrements
    /// stock only from this state, so re-confirming (or confirming a cod
    /// order that was already decremented at creation) never decrements twice.
    pub fn is_awaiting_payment(&self) -> bool {
        matches!(self, Self::PendingPayment)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db())
    }
}

/// Payment settlement status, tracked independently of the order status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Prepaid, gateway outcome not yet known
    Pending,
    /// Cash on delivery, collected at the door
    PendingCod,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "pending_cod" => Some(Self::PendingCod),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingCod => "pending_cod",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db())
    }
}

/// Shipping progress for an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    Pending,
    Shipped,
    Delivered,
}

impl ShippingStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }
}

/// Supported payment methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery
    Cod,
    /// JazzCash mobile wallet
    Jazzcash,
    /// Easypaisa mobile wallet
    Easypaisa,
    /// Card payment page
    Card,
}

impl PaymentMethod {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "cod" => Some(Self::Cod),
            "jazzcash" => Some(Self::Jazzcash),
            "easypaisa" => Some(Self::Easypaisa),
            "card" => Some(Self::Card),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Jazzcash => "jazzcash",
            Self::Easypaisa => "easypaisa",
            Self::Card => "card",
        }
    }

    /// Does this method settle through an external gateway redirect?
    pub fn is_prepaid(&self) -> bool {
        !matches!(self, Self::Cod)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db())
    }
}
