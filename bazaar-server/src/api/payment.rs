//! Payment endpoints: gateway redirect, callback and status view

use axum::Json;
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::{ApiResponse, OrderStatus, PaymentMethod, PaymentStatus};

use crate::state::AppState;

use super::ApiResult;

/// POST /api/Payment/Initiate
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub order_id: i64,
    pub return_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub order_id: i64,
    pub payment_method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_url: String,
}

pub async fn initiate(
    State(state): State<AppState>,
    Json(req): Json<InitiateRequest>,
) -> ApiResult<InitiateResponse> {
    let initiated = state
        .workflow
        .initiate_payment(req.order_id, &req.return_url)
        .await?;

    Ok(ApiResponse::success(InitiateResponse {
        order_id: initiated.order_id,
        payment_method: initiated.method,
        amount: initiated.amount,
        payment_url: initiated.payment_url,
    }))
}

/// POST /api/Payment/Callback
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub order_id: i64,
    pub success: bool,
    pub transaction_id: Option<String>,
    /// Free-text gateway narrative. Logged, never persisted.
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub order_id: i64,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
}

pub async fn callback(
    State(state): State<AppState>,
    Json(req): Json<CallbackRequest>,
) -> ApiResult<CallbackResponse> {
    if let Some(note) = req.message.as_deref() {
        tracing::info!(order_id = req.order_id, note, "Gateway callback note");
    }

    let outcome = state
        .workflow
        .payment_callback(req.order_id, req.success, req.transaction_id)
        .await?;

    Ok(ApiResponse::success_with_message(
        outcome.message,
        CallbackResponse {
            order_id: outcome.order_id,
            order_status: outcome.order_status,
            payment_status: outcome.payment_status,
        },
    ))
}

/// GET /api/Payment/Status/{order_id}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub order_id: i64,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_date: Option<i64>,
    pub order_status: OrderStatus,
}

pub async fn status(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> ApiResult<PaymentStatusResponse> {
    let view = state.workflow.payment_status(order_id).await?;

    Ok(ApiResponse::success(PaymentStatusResponse {
        order_id: view.order_id,
        payment_status: view.payment_status,
        transaction_id: view.transaction_id,
        payment_date: view.payment_date,
        order_status: view.order_status,
    }))
}
