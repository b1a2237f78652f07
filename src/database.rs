use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::seat_grid::SeatGrid;
use crate::store::{PgCatalogStore, PgLedger, PgUserDirectory, StoreError};

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    pub async fn new(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed");
        Ok(())
    }

    pub fn ledger(&self, grid: SeatGrid) -> PgLedger {
        PgLedger::new(self.pool.clone(), grid)
    }

    pub fn users(&self) -> PgUserDirectory {
        PgUserDirectory::new(self.pool.clone())
    }

    pub fn catalog(&self) -> PgCatalogStore {
        PgCatalogStore::new(self.pool.clone())
    }
}
