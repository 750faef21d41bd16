//! Application state for bazaar-server

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::db::PgStore;
use crate::stock::StockLedger;
use crate::workflow::OrderWorkflow;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Order lifecycle engine
    pub workflow: OrderWorkflow,
    /// Stock ledger
    pub ledger: StockLedger,
    /// JWT secret for staff authentication
    pub jwt_secret: String,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let store = Arc::new(PgStore::new(pool.clone()));
        let workflow = OrderWorkflow::new(store.clone(), store.clone(), config.restock_on_cancel);
        let ledger = StockLedger::new(store);

        Ok(Self {
            pool,
            workflow,
            ledger,
            jwt_secret: config.jwt_secret.clone(),
        })
    }
}
