//! User and directory queries for the auth endpoints

use sqlx::PgPool;

/// A user joined with their shop. `shop_name` and `shop_is_deleted` are
/// `NULL` for users without a shop and for dangling shop references.
#[derive(sqlx::FromRow)]
pub struct LoginUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub shop_id: Option<i64>,
    pub shop_name: Option<String>,
    pub shop_is_deleted: Option<bool>,
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<LoginUser>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT u.id, u.username, u.password_hash, u.role, u.shop_id,
               s.name AS shop_name, s.is_deleted AS shop_is_deleted
        FROM users u
        LEFT JOIN shops s ON s.id = u.shop_id
        WHERE u.email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    id: i64,
    username: &str,
    email: &str,
    password_hash: &str,
    role: &str,
    shop_id: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, shop_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(shop_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn role_exists(pool: &PgPool, role: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1)")
        .bind(role)
        .fetch_one(pool)
        .await
}

/// `None` when the shop does not exist, otherwise its `is_deleted` flag.
pub async fn shop_is_deleted(pool: &PgPool, shop_id: i64) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar("SELECT is_deleted FROM shops WHERE id = $1")
        .bind(shop_id)
        .fetch_optional(pool)
        .await
}
