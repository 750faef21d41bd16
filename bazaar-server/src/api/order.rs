//! Order endpoints: checkout, tracking and back-office status changes

use axum::extract::{Path, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::{
    ApiResponse, AppError, ErrorCode, OrderStatus, PaymentMethod, PaymentStatus, ShippingStatus,
};

use crate::auth::{Identity, require_staff};
use crate::db::{NewOrderItem, OrderAggregate, StatusChange};
use crate::state::AppState;
use crate::workflow::OrderDraft;

use super::ApiResult;

/// POST /api/Order/CreateOrder
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shop_id: i64,
    pub customer: CustomerInfo,
    pub shipping: ShippingInfo,
    pub payment: PaymentSelection,
    pub cart_items: Vec<CartItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub customer_id: Option<i64>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSelection {
    pub method: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_id: i64,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<OrderCreatedResponse> {
    let method = PaymentMethod::from_db(&req.payment.method.trim().to_lowercase())
        .ok_or_else(|| AppError::new(ErrorCode::UnsupportedPaymentMethod))?;

    let items = req
        .cart_items
        .into_iter()
        .map(|item| NewOrderItem {
            product_id: item.product_id,
            product_name: item.name,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();

    let created = state
        .workflow
        .create_order(OrderDraft {
            shop_id: req.shop_id,
            customer_id: req.customer.customer_id,
            full_name: req.customer.full_name,
            email: req.customer.email,
            phone: req.customer.phone,
            address: req.shipping.address,
            city: req.shipping.city,
            province: req.shipping.province,
            postal_code: req.shipping.postal_code,
            method,
            items,
        })
        .await?;

    Ok(ApiResponse::success_with_message(
        "Order placed successfully.",
        OrderCreatedResponse {
            order_id: created.order_id,
            order_status: created.order_status,
            payment_status: created.payment_status,
            total_amount: created.total_amount,
        },
    ))
}

/// GET /api/Order/GetOrder/{order_id}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub shop_id: i64,
    pub customer_id: Option<i64>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
    pub shipping: ShippingDetails,
    pub payment: PaymentDetails,
    pub items: Vec<OrderItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub shipping_status: ShippingStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_date: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl From<OrderAggregate> for OrderResponse {
    fn from(aggregate: OrderAggregate) -> Self {
        Self {
            order_id: aggregate.order.id,
            shop_id: aggregate.order.shop_id,
            customer_id: aggregate.order.customer_id,
            order_status: aggregate.order.order_status,
            payment_status: aggregate.order.payment_status,
            total_amount: aggregate.order.total_amount,
            created_at: aggregate.order.created_at,
            updated_at: aggregate.order.updated_at,
            shipping: ShippingDetails {
                full_name: aggregate.shipping.full_name,
                email: aggregate.shipping.email,
                phone: aggregate.shipping.phone,
                address: aggregate.shipping.address,
                city: aggregate.shipping.city,
                province: aggregate.shipping.province,
                postal_code: aggregate.shipping.postal_code,
                shipping_status: aggregate.shipping.shipping_status,
            },
            payment: PaymentDetails {
                method: aggregate.payment.method,
                amount: aggregate.payment.amount,
                payment_status: aggregate.payment.payment_status,
                transaction_id: aggregate.payment.transaction_id,
                payment_date: aggregate.payment.payment_date,
            },
            items: aggregate
                .items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id,
                    name: item.product_name,
                    quantity: item.quantity,
                    price: item.price,
                    total: item.total,
                })
                .collect(),
        }
    }
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> ApiResult<OrderResponse> {
    let aggregate = state.workflow.get_order(order_id).await?;
    Ok(ApiResponse::success(aggregate.into()))
}

/// POST /api/Order/CancelOrder/{order_id}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderResponse {
    pub order_id: i64,
    pub previous_status: OrderStatus,
    pub restocked: bool,
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(req): Json<CancelOrderRequest>,
) -> ApiResult<CancelOrderResponse> {
    let applied = state
        .workflow
        .cancel_order(order_id, req.reason.as_deref())
        .await?;

    Ok(ApiResponse::success_with_message(
        "Order cancelled successfully.",
        CancelOrderResponse {
            order_id,
            previous_status: applied.previous_status,
            restocked: applied.restocked,
        },
    ))
}

/// PATCH /api/Order/UpdateStatus/{order_id}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusResponse {
    pub order_id: i64,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<UpdateStatusResponse> {
    require_staff(&identity)?;

    let change = StatusChange {
        order_status: req.order_status.clone(),
        payment_status: req.payment_status.clone(),
        transaction_id: req.transaction_id,
    };
    state.workflow.update_status(order_id, change).await?;

    Ok(ApiResponse::success_with_message(
        "Order status updated successfully.",
        UpdateStatusResponse {
            order_id,
            order_status: req.order_status,
            payment_status: req.payment_status,
        },
    ))
}
