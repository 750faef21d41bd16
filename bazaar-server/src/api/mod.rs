//! HTTP API for the bazaar back office

mod auth;
mod health;
mod order;
mod payment;
mod stock;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use shared::{ApiResponse, AppError};

use crate::auth::auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Storefront endpoints: checkout, tracking, gateway traffic
    let public = Router::new()
        .route("/api/Order/CreateOrder", post(order::create_order))
        .route("/api/Order/GetOrder/{order_id}", get(order::get_order))
        .route(
            "/api/Order/CancelOrder/{order_id}",
            post(order::cancel_order),
        )
        .route("/api/Payment/Initiate", post(payment::initiate))
        .route("/api/Payment/Callback", post(payment::callback))
        .route("/api/Payment/Status/{order_id}", get(payment::status))
        .route("/api/Stock/GetStockByShop/{shop_id}", get(stock::by_shop))
        .route("/api/Stock/GetStockHistory/{stock_id}", get(stock::history))
        .route("/api/Auth/Login", post(auth::login))
        .route("/api/Auth/Register", post(auth::register));

    // Staff endpoints behind JWT
    let protected = Router::new()
        .route(
            "/api/Order/UpdateStatus/{order_id}",
            patch(order::update_status),
        )
        .route("/api/Stock/AddQuantity", post(stock::add_quantity))
        .route("/api/Stock/ReduceQuantity", post(stock::reduce_quantity))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public)
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
