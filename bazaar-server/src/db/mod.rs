//! Storage layer: repository traits and their PostgreSQL implementation
//!
//! Every write path runs in a single transaction. Stock rows are locked
//! with `SELECT ... FOR UPDATE` before any quantity change, so concurrent
//! confirmations and adjustments serialize per row.

mod orders;
mod payments;
mod stock;
pub mod users;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use shared::models::{OrderStatus, PaymentMethod, PaymentStatus, ShippingStatus, StockChangeType};

use crate::error::StoreResult;

/// Generate a Snowflake-style i64 id.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
///
/// Non-sequential (order volume cannot be inferred from ids), roughly
/// time-ordered, stateless (no counter to persist across restarts).
/// Primary key uniqueness is the ultimate safety net.
pub(crate) fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = crate::util::now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

// Status columns are TEXT; an unparseable value means the row was written
// outside this codebase and is treated as a storage fault.

pub(crate) fn parse_order_status(raw: &str) -> StoreResult<OrderStatus> {
    OrderStatus::from_db(raw)
        .ok_or_else(|| crate::error::StoreError::Database(format!("unexpected order_status '{raw}'")))
}

pub(crate) fn parse_payment_status(raw: &str) -> StoreResult<PaymentStatus> {
    PaymentStatus::from_db(raw).ok_or_else(|| {
        crate::error::StoreError::Database(format!("unexpected payment_status '{raw}'"))
    })
}

pub(crate) fn parse_shipping_status(raw: &str) -> StoreResult<ShippingStatus> {
    ShippingStatus::from_db(raw).ok_or_else(|| {
        crate::error::StoreError::Database(format!("unexpected shipping_status '{raw}'"))
    })
}

pub(crate) fn parse_change_type(raw: &str) -> StoreResult<StockChangeType> {
    StockChangeType::from_db(raw)
        .ok_or_else(|| crate::error::StoreError::Database(format!("unexpected change_type '{raw}'")))
}

// ── Order records ──

/// One line item of an incoming order
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// Everything needed to persist a new order in one transaction
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shop_id: i64,
    pub customer_id: Option<i64>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub method: PaymentMethod,
    pub items: Vec<NewOrderItem>,
    pub total_amount: Decimal,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Reserve stock as part of the insert (cash-on-delivery path)
    pub decrement_stock: bool,
}

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: i64,
    pub shop_id: i64,
    pub customer_id: Option<i64>,
    pub total_amount: Decimal,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct ShippingRow {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub shipping_status: ShippingStatus,
}

#[derive(Debug, Clone)]
pub struct PaymentRow {
    /// Raw method string as stored; parsed on demand so stale rows with a
    /// method we no longer support still render in views
    pub method: String,
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_date: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct OrderItemRow {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

/// Full order view joined across orders, shipping, payment and line items
#[derive(Debug, Clone)]
pub struct OrderAggregate {
    pub order: OrderRow,
    pub shipping: ShippingRow,
    pub payment: PaymentRow,
    pub items: Vec<OrderItemRow>,
}

/// Status transition applied by the back office
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
}

/// Outcome of a cancellation
#[derive(Debug, Clone)]
pub struct CancelApplied {
    /// Status the order held before it was cancelled
    pub previous_status: OrderStatus,
    /// Stock was returned to the shelf
    pub restocked: bool,
}

// ── Payment records ──

/// Order/payment snapshot the gateway adapter works from
#[derive(Debug, Clone)]
pub struct PaymentContext {
    pub order_status: OrderStatus,
    pub method: String,
    pub amount: Decimal,
}

/// Outcome of a gateway callback
#[derive(Debug, Clone)]
pub struct CallbackApplied {
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Callback hit an already-paid payment; nothing was changed
    pub already_settled: bool,
}

#[derive(Debug, Clone)]
pub struct PaymentStatusView {
    pub order_id: i64,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_date: Option<i64>,
    pub order_status: OrderStatus,
}

// ── Stock records ──

#[derive(Debug, Clone)]
pub struct ShopStockRow {
    pub stock_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub last_updated: i64,
}

/// Outcome of a manual stock adjustment
#[derive(Debug, Clone)]
pub struct StockAdjusted {
    pub stock_id: i64,
    pub previous_quantity: i32,
    pub new_quantity: i32,
}

#[derive(Debug, Clone)]
pub struct StockHistoryRow {
    pub id: i64,
    pub stock_id: i64,
    pub product_id: i64,
    pub shop_id: i64,
    pub change_type: StockChangeType,
    pub quantity_changed: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub changed_by: String,
    pub changed_at: i64,
}

// ── Repository traits ──

/// Order persistence operations
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert order, line items, shipping and payment rows in one
    /// transaction. Decrements stock when `decrement_stock` is set;
    /// insufficient stock rolls the whole order back.
    async fn create(&self, order: NewOrder) -> StoreResult<i64>;

    /// Load the full order view.
    async fn load(&self, order_id: i64) -> StoreResult<OrderAggregate>;

    /// Apply a status transition, mirroring the payment status onto the
    /// payment row. Confirming an order that is still awaiting payment
    /// performs the deferred stock decrement exactly once.
    async fn update_status(&self, order_id: i64, change: StatusChange) -> StoreResult<()>;

    /// Cancel the order and mark its payment refunded. When
    /// `restock_if_confirmed` is set, an order cancelled from `confirmed`
    /// has its stock returned to the shelf.
    async fn cancel(&self, order_id: i64, restock_if_confirmed: bool)
    -> StoreResult<CancelApplied>;
}

/// Payment persistence operations
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Snapshot of order status, payment method and amount.
    async fn payment_context(&self, order_id: i64) -> StoreResult<PaymentContext>;

    /// Apply a gateway callback. An already-paid payment short-circuits
    /// without touching anything; a successful payment on an order still
    /// awaiting payment confirms it and decrements stock.
    async fn record_callback(
        &self,
        order_id: i64,
        success: bool,
        transaction_id: Option<String>,
    ) -> StoreResult<CallbackApplied>;

    /// Read-only payment status view.
    async fn status_view(&self, order_id: i64) -> StoreResult<PaymentStatusView>;
}

/// Stock persistence operations
#[async_trait]
pub trait StockStore: Send + Sync {
    /// All live stock rows for a shop.
    async fn shop_stock(&self, shop_id: i64) -> StoreResult<Vec<ShopStockRow>>;

    /// Apply a manual adjustment and append the matching history row.
    async fn adjust(
        &self,
        stock_id: i64,
        quantity: i32,
        change: StockChangeType,
        actor: &str,
    ) -> StoreResult<StockAdjusted>;

    /// Adjustment history for a stock row, most recent first.
    async fn history(&self, stock_id: i64) -> StoreResult<Vec<StockHistoryRow>>;
}

/// PostgreSQL-backed implementation of all three store traits
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
