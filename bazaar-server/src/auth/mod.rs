//! JWT authentication for the back-office endpoints

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use shared::{AppError, AppResult, ErrorCode};

use crate::state::AppState;

pub const ROLE_SUPER_ADMIN: &str = "superAdmin";
pub const ROLE_SHOP_ADMIN: &str = "shopAdmin";
pub const ROLE_CUSTOMER: &str = "customer";

const JWT_EXPIRY_HOURS: i64 = 2;

/// JWT claims for back-office users
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// User ID
    pub user_id: i64,
    /// Role name
    pub role: String,
    /// Shop the user manages, if any
    pub shop_id: Option<i64>,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated identity extracted from a verified token
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub shop_id: Option<i64>,
}

impl Identity {
    /// Staff can change order statuses and move stock
    pub fn is_staff(&self) -> bool {
        self.role == ROLE_SHOP_ADMIN || self.role == ROLE_SUPER_ADMIN
    }
}

/// Create a signed token for a logged-in user
pub fn create_token(
    user_id: i64,
    username: &str,
    role: &str,
    shop_id: Option<i64>,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        user_id,
        role: role.to_string(),
        shop_id,
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Middleware that verifies the bearer token from the Authorization header
/// and stores the caller's [`Identity`] in request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated).into_response())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated).into_response())?;

    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        let code = match e.kind() {
            ErrorKind::ExpiredSignature => ErrorCode::TokenExpired,
            _ => ErrorCode::TokenInvalid,
        };
        AppError::new(code).into_response()
    })?;

    let claims = token_data.claims;
    request.extensions_mut().insert(Identity {
        user_id: claims.user_id,
        username: claims.sub,
        role: claims.role,
        shop_id: claims.shop_id,
    });

    Ok(next.run(request).await)
}

/// Reject callers whose role cannot manage orders or stock
pub fn require_staff(identity: &Identity) -> AppResult<()> {
    if identity.is_staff() {
        return Ok(());
    }
    Err(AppError::new(ErrorCode::PermissionDenied))
}
