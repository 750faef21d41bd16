//! Stock endpoints: shop inventory, manual adjustments and history

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use shared::{ApiResponse, StockChangeType};

use crate::auth::{Identity, require_staff};
use crate::db::{ShopStockRow, StockHistoryRow};
use crate::state::AppState;

use super::ApiResult;

/// GET /api/Stock/GetStockByShop/{shop_id}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRowResponse {
    pub stock_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub last_updated: i64,
}

impl From<ShopStockRow> for StockRowResponse {
    fn from(row: ShopStockRow) -> Self {
        Self {
            stock_id: row.stock_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            last_updated: row.last_updated,
        }
    }
}

pub async fn by_shop(
    State(state): State<AppState>,
    Path(shop_id): Path<i64>,
) -> ApiResult<Vec<StockRowResponse>> {
    let rows = state.ledger.shop_stock(shop_id).await?;
    Ok(ApiResponse::success(
        rows.into_iter().map(Into::into).collect(),
    ))
}

/// POST /api/Stock/AddQuantity and /api/Stock/ReduceQuantity
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub stock_id: i64,
    pub quantity: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustedResponse {
    pub stock_id: i64,
    pub previous_quantity: i32,
    pub new_quantity: i32,
}

async fn apply_adjustment(
    state: &AppState,
    identity: &Identity,
    req: AdjustStockRequest,
    change: StockChangeType,
    message: &'static str,
) -> ApiResult<StockAdjustedResponse> {
    require_staff(identity)?;

    let adjusted = state
        .ledger
        .adjust(req.stock_id, req.quantity, change, &identity.username)
        .await?;

    Ok(ApiResponse::success_with_message(
        message,
        StockAdjustedResponse {
            stock_id: adjusted.stock_id,
            previous_quantity: adjusted.previous_quantity,
            new_quantity: adjusted.new_quantity,
        },
    ))
}

pub async fn add_quantity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<AdjustStockRequest>,
) -> ApiResult<StockAdjustedResponse> {
    apply_adjustment(
        &state,
        &identity,
        req,
        StockChangeType::Add,
        "Quantity added successfully.",
    )
    .await
}

pub async fn reduce_quantity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<AdjustStockRequest>,
) -> ApiResult<StockAdjustedResponse> {
    apply_adjustment(
        &state,
        &identity,
        req,
        StockChangeType::Reduce,
        "Quantity reduced successfully.",
    )
    .await
}

/// GET /api/Stock/GetStockHistory/{stock_id}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistoryResponse {
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

impl From<StockHistoryRow> for StockHistoryResponse {
    fn from(row: StockHistoryRow) -> Self {
        Self {
            id: row.id,
            stock_id: row.stock_id,
            product_id: row.product_id,
            shop_id: row.shop_id,
            change_type: row.change_type,
            quantity_changed: row.quantity_changed,
            previous_quantity: row.previous_quantity,
            new_quantity: row.new_quantity,
            changed_by: row.changed_by,
            changed_at: row.changed_at,
        }
    }
}

pub async fn history(
    State(state): State<AppState>,
    Path(stock_id): Path<i64>,
) -> ApiResult<Vec<StockHistoryResponse>> {
    let rows = state.ledger.history(stock_id).await?;
    Ok(ApiResponse::success(
        rows.into_iter().map(Into::into).collect(),
    ))
}
