//! Authentication endpoints: login and staff registration

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use shared::{ApiResponse, AppError, ErrorCode};

use crate::auth::{ROLE_SHOP_ADMIN, create_token};
use crate::db::{self, users};
use crate::state::AppState;
use crate::util::{hash_password, now_millis, verify_password};

use super::ApiResult;

/// POST /api/Auth/Login
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub shop_id: Option<i64>,
    pub shop_name: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let user = users::find_by_email(&state.pool, &email)
        .await
        .map_err(|e| {
            tracing::error!("DB error during login: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::new(ErrorCode::InvalidCredentials));
    }

    if shop_access_revoked(&user.role, user.shop_id, user.shop_is_deleted) {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let token = create_token(
        user.id,
        &user.username,
        &user.role,
        user.shop_id,
        &state.jwt_secret,
    )
    .map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(ApiResponse::success(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        role: user.role,
        shop_id: user.shop_id,
        shop_name: user.shop_name,
    }))
}

/// A shop admin loses access the moment their shop is deactivated. A shop
/// reference that no longer resolves (`shop_is_deleted` = `None`) counts as
/// deactivated.
fn shop_access_revoked(role: &str, shop_id: Option<i64>, shop_is_deleted: Option<bool>) -> bool {
    role == ROLE_SHOP_ADMIN && shop_id.is_some() && shop_is_deleted.unwrap_or(true)
}

/// POST /api/Auth/Register
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub shop_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<RegisterResponse> {
    let email = req.email.trim().to_lowercase();
    let username = req.username.trim().to_string();

    if username.is_empty() || email.is_empty() {
        return Err(AppError::validation("Username and email are required"));
    }
    if req.password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let role_ok = users::role_exists(&state.pool, &req.role)
        .await
        .map_err(|e| {
            tracing::error!("DB error during registration: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;
    if !role_ok {
        return Err(AppError::new(ErrorCode::InvalidRole));
    }

    // Shop admins must name a shop, and any named shop must be live
    if req.role == ROLE_SHOP_ADMIN && req.shop_id.is_none() {
        return Err(AppError::new(ErrorCode::InvalidShop));
    }
    if let Some(shop_id) = req.shop_id {
        let deleted = users::shop_is_deleted(&state.pool, shop_id)
            .await
            .map_err(|_| AppError::new(ErrorCode::InternalError))?;
        if deleted.unwrap_or(true) {
            return Err(AppError::new(ErrorCode::InvalidShop));
        }
    }

    let taken = users::email_exists(&state.pool, &email)
        .await
        .map_err(|_| AppError::new(ErrorCode::InternalError))?;
    if taken {
        return Err(AppError::with_message(
            ErrorCode::AlreadyExists,
            "Email is already registered.",
        ));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    let user_id = db::snowflake_id();
    users::create(
        &state.pool,
        user_id,
        &username,
        &email,
        &password_hash,
        &req.role,
        req.shop_id,
        now_millis(),
    )
    .await
    .map_err(|e| {
        tracing::error!("DB error during registration: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!(user_id, role = %req.role, "User registered");

    Ok(ApiResponse::success(RegisterResponse {
        user_id,
        username,
        role: req.role,
    }))
}
