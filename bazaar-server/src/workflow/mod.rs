//! Order lifecycle engine.
//!
//! Sits between the HTTP handlers and the stores: validates checkout
//! input, prices the order server-side, picks the initial status for
//! the chosen payment method and drives settlement. Stock movements
//! happen inside the store transactions so they commit or roll back
//! together with the order rows.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{AppError, AppResult, ErrorCode, OrderStatus, PaymentMethod, PaymentStatus};

use crate::db::{
    CancelApplied, NewOrder, NewOrderItem, OrderAggregate, OrderStore, PaymentStatusView,
    PaymentStore, StatusChange,
};
use crate::gateway;

/// Checkout input after the HTTP layer has parsed the payment method.
#[derive(Debug, Clone)]
pub struct OrderDraft {
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
}

/// What the customer gets back right after checkout.
#[derive(Debug, Clone)]
pub struct OrderCreated {
    pub order_id: i64,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
}

/// Redirect target for a prepaid order.
#[derive(Debug, Clone)]
pub struct PaymentInitiated {
    pub order_id: i64,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub payment_url: String,
}

/// Settlement result reported back after a gateway callback.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub order_id: i64,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub message: &'static str,
}

#[derive(Clone)]
pub struct OrderWorkflow {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    /// Return confirmed stock to the shelf when such an order is cancelled
    restock_on_cancel: bool,
}

impl OrderWorkflow {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        restock_on_cancel: bool,
    ) -> Self {
        Self {
            orders,
            payments,
            restock_on_cancel,
        }
    }

    /// Validate and persist a checkout.
    ///
    /// Cash on delivery goes straight to `processing` and reserves stock
    /// in the same transaction. Prepaid methods park the order in
    /// `pending_payment`; stock is only taken once the gateway confirms.
    pub async fn create_order(&self, draft: OrderDraft) -> AppResult<OrderCreated> {
        if draft.items.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyOrder));
        }
        for item in &draft.items {
            if item.quantity <= 0 {
                return Err(AppError::validation(format!(
                    "Quantity for product {} must be greater than zero",
                    item.product_id
                )));
            }
            if item.price <= Decimal::ZERO {
                return Err(AppError::validation(format!(
                    "Price for product {} must be greater than zero",
                    item.product_id
                )));
            }
        }
        let required = [
            ("fullName", &draft.full_name),
            ("phone", &draft.phone),
            ("address", &draft.address),
            ("city", &draft.city),
            ("province", &draft.province),
            ("postalCode", &draft.postal_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{field} is required")));
            }
        }

        // Client totals are never trusted
        let total_amount: Decimal = draft
            .items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();

        let (order_status, payment_status, decrement_stock) = if draft.method.is_prepaid() {
            (OrderStatus::PendingPayment, PaymentStatus::Pending, false)
        } else {
            (OrderStatus::Processing, PaymentStatus::PendingCod, true)
        };

        let order_id = self
            .orders
            .create(NewOrder {
                shop_id: draft.shop_id,
                customer_id: draft.customer_id,
                full_name: draft.full_name,
                email: draft.email,
                phone: draft.phone,
                address: draft.address,
                city: draft.city,
                province: draft.province,
                postal_code: draft.postal_code,
                method: draft.method,
                items: draft.items,
                total_amount,
                order_status: order_status.clone(),
                payment_status: payment_status.clone(),
                decrement_stock,
            })
            .await?;

        tracing::info!(
            order_id,
            order_status = %order_status,
            total = %total_amount,
            "Order created"
        );

        Ok(OrderCreated {
            order_id,
            order_status,
            payment_status,
            total_amount,
        })
    }

    pub async fn get_order(&self, order_id: i64) -> AppResult<OrderAggregate> {
        Ok(self.orders.load(order_id).await?)
    }

    /// Apply a back-office status change. The store decrements stock when
    /// the order leaves `pending_payment` for `confirmed`.
    pub async fn update_status(&self, order_id: i64, change: StatusChange) -> AppResult<()> {
        let order_status = change.order_status.clone();
        let payment_status = change.payment_status.clone();
        self.orders.update_status(order_id, change).await?;
        tracing::info!(
            order_id,
            order_status = %order_status,
            payment_status = %payment_status,
            "Order status updated"
        );
        Ok(())
    }

    /// Cancel an order that has not shipped yet.
    ///
    /// The reason is kept in the log only; it is not part of the order
    /// record.
    pub async fn cancel_order(
        &self,
        order_id: i64,
        reason: Option<&str>,
    ) -> AppResult<CancelApplied> {
        let applied = self.orders.cancel(order_id, self.restock_on_cancel).await?;
        tracing::info!(
            order_id,
            previous_status = %applied.previous_status,
            restocked = applied.restocked,
            reason = reason.unwrap_or("-"),
            "Order cancelled"
        );
        Ok(applied)
    }

    /// Build the gateway redirect for an order awaiting payment.
    pub async fn initiate_payment(
        &self,
        order_id: i64,
        return_url: &str,
    ) -> AppResult<PaymentInitiated> {
        let context = self.payments.payment_context(order_id).await?;

        if !context.order_status.is_awaiting_payment() {
            return Err(AppError::new(ErrorCode::OrderNotAwaitingPayment));
        }

        let method = PaymentMethod::from_db(&context.method)
            .ok_or_else(|| AppError::new(ErrorCode::UnsupportedPaymentMethod))?;
        // Cash on delivery never reaches a gateway
        let payment_url = gateway::payment_url(&method, order_id, context.amount, return_url)
            .ok_or_else(|| AppError::new(ErrorCode::UnsupportedPaymentMethod))?;

        Ok(PaymentInitiated {
            order_id,
            method,
            amount: context.amount,
            payment_url,
        })
    }

    /// Record a gateway callback. Replays against an already-paid order
    /// change nothing and report the settled state.
    pub async fn payment_callback(
        &self,
        order_id: i64,
        success: bool,
        transaction_id: Option<String>,
    ) -> AppResult<CallbackOutcome> {
        let applied = self
            .payments
            .record_callback(order_id, success, transaction_id)
            .await?;

        let message = if applied.already_settled {
            "Payment already processed"
        } else if success {
            "Payment processed successfully"
        } else {
            "Payment failed"
        };
        tracing::info!(
            order_id,
            success,
            replay = applied.already_settled,
            order_status = %applied.order_status,
            "Payment callback recorded"
        );

        Ok(CallbackOutcome {
            order_id,
            order_status: applied.order_status,
            payment_status: applied.payment_status,
            message,
        })
    }

    pub async fn payment_status(&self, order_id: i64) -> AppResult<PaymentStatusView> {
        Ok(self.payments.status_view(order_id).await?)
    }
}

#[cfg(test)]
mod tests;
