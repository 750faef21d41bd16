//! In-memory store backing the workflow and ledger tests
//!
//! Mirrors the PostgreSQL implementation's observable behavior, including
//! its all-or-nothing writes: any check that would roll a transaction back
//! runs before the first mutation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use shared::models::{OrderStatus, PaymentStatus, ShippingStatus, StockChangeType};

use crate::error::{StoreError, StoreResult};

use super::{
    CallbackApplied, CancelApplied, NewOrder, OrderAggregate, OrderItemRow, OrderRow, OrderStore,
    PaymentContext, PaymentRow, PaymentStatusView, PaymentStore, ShippingRow, ShopStockRow,
    StatusChange, StockAdjusted, StockHistoryRow, StockStore,
};

#[derive(Clone)]
struct MemOrder {
    shop_id: i64,
    customer_id: Option<i64>,
    total_amount: Decimal,
    order_status: OrderStatus,
    payment_status: PaymentStatus,
    created_at: i64,
    updated_at: i64,
}

#[derive(Clone)]
struct MemPayment {
    method: String,
    amount: Decimal,
    payment_status: PaymentStatus,
    transaction_id: Option<String>,
    payment_date: Option<i64>,
}

#[derive(Clone)]
struct MemStock {
    product_id: i64,
    shop_id: i64,
    quantity: i32,
    last_updated: i64,
    is_deleted: bool,
}

#[derive(Default)]
struct Inner {
    /// shop_id -> is_deleted
    shops: HashMap<i64, bool>,
    /// product_id -> name
    products: HashMap<i64, String>,
    orders: HashMap<i64, MemOrder>,
    items: HashMap<i64, Vec<OrderItemRow>>,
    shipping: HashMap<i64, ShippingRow>,
    payments: HashMap<i64, MemPayment>,
    stock: BTreeMap<i64, MemStock>,
    history: Vec<StockHistoryRow>,
    next_id: i64,
}

impl Inner {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn decrement(&mut self, grouped: &BTreeMap<i64, i32>, shop_id: i64, now: i64) -> StoreResult<()> {
        for (&product_id, &requested) in grouped {
            let available = self
                .stock
                .values()
                .find(|s| s.product_id == product_id && s.shop_id == shop_id && !s.is_deleted)
                .map(|s| s.quantity)
                .unwrap_or(0);
            if available < requested {
                return Err(StoreError::InsufficientStock {
                    product_id,
                    requested,
                    available,
                });
            }
        }
        for (&product_id, &qty) in grouped {
            if let Some(stock) = self
                .stock
                .values_mut()
                .find(|s| s.product_id == product_id && s.shop_id == shop_id && !s.is_deleted)
            {
                stock.quantity -= qty;
                stock.last_updated = now;
            }
        }
        Ok(())
    }

    fn restock(&mut self, grouped: &BTreeMap<i64, i32>, shop_id: i64, now: i64) {
        for (&product_id, &qty) in grouped {
            if let Some(stock) = self
                .stock
                .values_mut()
                .find(|s| s.product_id == product_id && s.shop_id == shop_id && !s.is_deleted)
            {
                stock.quantity += qty;
                stock.last_updated = now;
            }
        }
    }

    fn grouped_items(&self, order_id: i64) -> BTreeMap<i64, i32> {
        let mut grouped = BTreeMap::new();
        if let Some(items) = self.items.get(&order_id) {
            for item in items {
                *grouped.entry(item.product_id).or_insert(0) += item.quantity;
            }
        }
        grouped
    }
}

/// In-memory implementation of all three store traits
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Seeding helpers
    // ========================================================================

    pub fn seed_shop(&self, shop_id: i64) {
        self.inner.lock().unwrap().shops.insert(shop_id, false);
    }

    pub fn deactivate_shop(&self, shop_id: i64) {
        self.inner.lock().unwrap().shops.insert(shop_id, true);
    }

    pub fn seed_product(&self, product_id: i64, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .products
            .insert(product_id, name.to_string());
    }

    pub fn seed_stock(&self, stock_id: i64, product_id: i64, shop_id: i64, quantity: i32) {
        self.inner.lock().unwrap().stock.insert(
            stock_id,
            MemStock {
                product_id,
                shop_id,
                quantity,
                last_updated: 0,
                is_deleted: false,
            },
        );
    }

    // ========================================================================
    // Inspection helpers
    // ========================================================================

    pub fn stock_quantity(&self, stock_id: i64) -> Option<i32> {
        self.inner
            .lock()
            .unwrap()
            .stock
            .get(&stock_id)
            .map(|s| s.quantity)
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().unwrap().orders.len()
    }

    pub fn shipping_status(&self, order_id: i64) -> Option<ShippingStatus> {
        self.inner
            .lock()
            .unwrap()
            .shipping
            .get(&order_id)
            .map(|s| s.shipping_status.clone())
    }

    /// Overwrite the raw method string, bypassing the typed write path.
    /// Lets tests exercise rows holding a method we no longer support.
    pub fn set_payment_method(&self, order_id: i64, method: &str) {
        if let Some(payment) = self.inner.lock().unwrap().payments.get_mut(&order_id) {
            payment.method = method.to_string();
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, order: NewOrder) -> StoreResult<i64> {
        let now = crate::util::now_millis();
        let mut inner = self.inner.lock().unwrap();

        match inner.shops.get(&order.shop_id) {
            Some(false) => {}
            _ => return Err(StoreError::ShopNotFound(order.shop_id)),
        }

        let items: Vec<OrderItemRow> = order
            .items
            .iter()
            .map(|i| OrderItemRow {
                product_id: i.product_id,
                product_name: i.product_name.clone(),
                quantity: i.quantity,
                price: i.price,
                total: i.price * Decimal::from(i.quantity),
            })
            .collect();

        // Check-and-take before any insert, like the transactional path
        if order.decrement_stock {
            let mut grouped = BTreeMap::new();
            for item in &items {
                *grouped.entry(item.product_id).or_insert(0) += item.quantity;
            }
            inner.decrement(&grouped, order.shop_id, now)?;
        }

        let order_id = inner.alloc_id();
        inner.orders.insert(
            order_id,
            MemOrder {
                shop_id: order.shop_id,
                customer_id: order.customer_id,
                total_amount: order.total_amount,
                order_status: order.order_status,
                payment_status: order.payment_status.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        inner.items.insert(order_id, items);
        inner.shipping.insert(
            order_id,
            ShippingRow {
                full_name: order.full_name,
                email: order.email,
                phone: order.phone,
                address: order.address,
                city: order.city,
                province: order.province,
                postal_code: order.postal_code,
                shipping_status: ShippingStatus::Pending,
            },
        );
        inner.payments.insert(
            order_id,
            MemPayment {
                method: order.method.as_db().to_string(),
                amount: order.total_amount,
                payment_status: order.payment_status,
                transaction_id: None,
                payment_date: None,
            },
        );

        Ok(order_id)
    }

    async fn load(&self, order_id: i64) -> StoreResult<OrderAggregate> {
        let inner = self.inner.lock().unwrap();
        let order = inner
            .orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        let shipping = inner.shipping.get(&order_id).expect("shipping row missing");
        let payment = inner.payments.get(&order_id).expect("payment row missing");

        Ok(OrderAggregate {
            order: OrderRow {
                id: order_id,
                shop_id: order.shop_id,
                customer_id: order.customer_id,
                total_amount: order.total_amount,
                order_status: order.order_status.clone(),
                payment_status: order.payment_status.clone(),
                created_at: order.created_at,
                updated_at: order.updated_at,
            },
            shipping: shipping.clone(),
            payment: PaymentRow {
                method: payment.method.clone(),
                amount: payment.amount,
                payment_status: payment.payment_status.clone(),
                transaction_id: payment.transaction_id.clone(),
                payment_date: payment.payment_date,
            },
            items: inner.items.get(&order_id).cloned().unwrap_or_default(),
        })
    }

    async fn update_status(&self, order_id: i64, change: StatusChange) -> StoreResult<()> {
        let now = crate::util::now_millis();
        let mut inner = self.inner.lock().unwrap();

        let (current, shop_id) = {
            let order = inner
                .orders
                .get(&order_id)
                .ok_or(StoreError::OrderNotFound(order_id))?;
            (order.order_status.clone(), order.shop_id)
        };

        // Failing decrement leaves nothing half-applied
        if change.order_status == OrderStatus::Confirmed && current.is_awaiting_payment() {
            let grouped = inner.grouped_items(order_id);
            inner.decrement(&grouped, shop_id, now)?;
        }

        let order = inner.orders.get_mut(&order_id).expect("checked above");
        order.order_status = change.order_status.clone();
        order.payment_status = change.payment_status.clone();
        order.updated_at = now;

        let payment = inner.payments.get_mut(&order_id).expect("payment row missing");
        payment.payment_status = change.payment_status.clone();
        if change.transaction_id.is_some() {
            payment.transaction_id = change.transaction_id;
        }
        if change.payment_status == PaymentStatus::Paid && payment.payment_date.is_none() {
            payment.payment_date = Some(now);
        }

        if change.order_status == OrderStatus::Confirmed {
            inner
                .shipping
                .get_mut(&order_id)
                .expect("shipping row missing")
                .shipping_status = ShippingStatus::Pending;
        }

        Ok(())
    }

    async fn cancel(
        &self,
        order_id: i64,
        restock_if_confirmed: bool,
    ) -> StoreResult<CancelApplied> {
        let now = crate::util::now_millis();
        let mut inner = self.inner.lock().unwrap();

        let (previous, shop_id) = {
            let order = inner
                .orders
                .get(&order_id)
                .ok_or(StoreError::OrderNotFound(order_id))?;
            (order.order_status.clone(), order.shop_id)
        };
        if !previous.is_cancellable() {
            return Err(StoreError::NotCancellable {
                order_id,
                status: previous,
            });
        }

        let restocked = restock_if_confirmed && previous == OrderStatus::Confirmed;
        if restocked {
            let grouped = inner.grouped_items(order_id);
            inner.restock(&grouped, shop_id, now);
        }

        let order = inner.orders.get_mut(&order_id).expect("checked above");
        order.order_status = OrderStatus::Cancelled;
        order.payment_status = PaymentStatus::Refunded;
        order.updated_at = now;
        inner
            .payments
            .get_mut(&order_id)
            .expect("payment row missing")
            .payment_status = PaymentStatus::Refunded;

        Ok(CancelApplied {
            previous_status: previous,
            restocked,
        })
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn payment_context(&self, order_id: i64) -> StoreResult<PaymentContext> {
        let inner = self.inner.lock().unwrap();
        let order = inner
            .orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        let payment = inner.payments.get(&order_id).expect("payment row missing");

        Ok(PaymentContext {
            order_status: order.order_status.clone(),
            method: payment.method.clone(),
            amount: payment.amount,
        })
    }

    async fn record_callback(
        &self,
        order_id: i64,
        success: bool,
        transaction_id: Option<String>,
    ) -> StoreResult<CallbackApplied> {
        let now = crate::util::now_millis();
        let mut inner = self.inner.lock().unwrap();

        let (order_status, shop_id) = {
            let order = inner
                .orders
                .get(&order_id)
                .ok_or(StoreError::PaymentNotFound(order_id))?;
            (order.order_status.clone(), order.shop_id)
        };
        let payment_status = inner
            .payments
            .get(&order_id)
            .expect("payment row missing")
            .payment_status
            .clone();

        if payment_status == PaymentStatus::Paid {
            return Ok(CallbackApplied {
                order_status,
                payment_status,
                already_settled: true,
            });
        }

        let confirming = success && order_status.is_awaiting_payment();
        if confirming {
            let grouped = inner.grouped_items(order_id);
            inner.decrement(&grouped, shop_id, now)?;
        }

        let new_payment_status = if success {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Failed
        };

        let payment = inner.payments.get_mut(&order_id).expect("payment row missing");
        payment.payment_status = new_payment_status.clone();
        payment.transaction_id = transaction_id;
        payment.payment_date = Some(now);

        let order = inner.orders.get_mut(&order_id).expect("checked above");
        let final_order_status = if confirming {
            order.order_status = OrderStatus::Confirmed;
            order.payment_status = PaymentStatus::Paid;
            order.updated_at = now;
            inner
                .shipping
                .get_mut(&order_id)
                .expect("shipping row missing")
                .shipping_status = ShippingStatus::Pending;
            OrderStatus::Confirmed
        } else {
            order.payment_status = new_payment_status.clone();
            order.updated_at = now;
            order_status
        };

        Ok(CallbackApplied {
            order_status: final_order_status,
            payment_status: new_payment_status,
            already_settled: false,
        })
    }

    async fn status_view(&self, order_id: i64) -> StoreResult<PaymentStatusView> {
        let inner = self.inner.lock().unwrap();
        let payment = inner
            .payments
            .get(&order_id)
            .ok_or(StoreError::PaymentNotFound(order_id))?;
        let order = inner.orders.get(&order_id).expect("order row missing");

        Ok(PaymentStatusView {
            order_id,
            payment_status: payment.payment_status.clone(),
            transaction_id: payment.transaction_id.clone(),
            payment_date: payment.payment_date,
            order_status: order.order_status.clone(),
        })
    }
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn shop_stock(&self, shop_id: i64) -> StoreResult<Vec<ShopStockRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<ShopStockRow> = inner
            .stock
            .iter()
            .filter(|(_, s)| s.shop_id == shop_id && !s.is_deleted)
            .map(|(&stock_id, s)| ShopStockRow {
                stock_id,
                product_id: s.product_id,
                product_name: inner
                    .products
                    .get(&s.product_id)
                    .cloned()
                    .unwrap_or_default(),
                quantity: s.quantity,
                last_updated: s.last_updated,
            })
            .collect();
        rows.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        Ok(rows)
    }

    async fn adjust(
        &self,
        stock_id: i64,
        quantity: i32,
        change: StockChangeType,
        actor: &str,
    ) -> StoreResult<StockAdjusted> {
        let now = crate::util::now_millis();
        let mut inner = self.inner.lock().unwrap();

        let (product_id, shop_id, previous_quantity) = {
            let stock = inner
                .stock
                .get(&stock_id)
                .filter(|s| !s.is_deleted)
                .ok_or(StoreError::StockNotFound(stock_id))?;
            (stock.product_id, stock.shop_id, stock.quantity)
        };

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

        let history_id = inner.alloc_id();
        {
            let stock = inner.stock.get_mut(&stock_id).expect("checked above");
            stock.quantity = new_quantity;
            stock.last_updated = now;
        }
        inner.history.push(StockHistoryRow {
            id: history_id,
            stock_id,
            product_id,
            shop_id,
            change_type: change,
            quantity_changed: quantity,
            previous_quantity,
            new_quantity,
            changed_by: actor.to_string(),
            changed_at: now,
        });

        Ok(StockAdjusted {
            stock_id,
            previous_quantity,
            new_quantity,
        })
    }

    async fn history(&self, stock_id: i64) -> StoreResult<Vec<StockHistoryRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<StockHistoryRow> = inner
            .history
            .iter()
            .filter(|h| h.stock_id == stock_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.changed_at
                .cmp(&a.changed_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }
}
