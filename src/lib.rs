pub mod cache;
pub mod catalog;
pub mod config;
pub mod console;
pub mod controllers;
pub mod database;
pub mod middleware;
pub mod models;
pub mod seat_grid;
pub mod services;
pub mod store;

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::CacheService;
use crate::catalog::Catalog;
use crate::config::{Config, StorageBackend};
use crate::database::Database;
use crate::seat_grid::SeatGrid;
use crate::services::{Accounts, ReservationEngine, ReservationPolicy};
use crate::store::{CatalogStore, Ledger, MemoryLedger, MemoryUserDirectory, StaticCatalogStore, UserDirectory};

// Shared state for the HTTP server and the console
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub engine: ReservationEngine,
    pub accounts: Accounts,
    pub cache: Option<CacheService>,
}

impl AppState {
    /// Connects the configured backing stores and loads the catalog.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let grid = SeatGrid::new(config.seating.rows, config.seating.seats_per_row)?;

        let (catalog, ledger, users): (Catalog, Arc<dyn Ledger>, Arc<dyn UserDirectory>) =
            match config.storage.backend {
                StorageBackend::Memory => {
                    let store = match &config.storage.catalog_path {
                        Some(path) => StaticCatalogStore::from_json_file(path).await?,
                        None => {
                            warn!("CATALOG_PATH not set; starting with an empty catalog");
                            StaticCatalogStore::default()
                        }
                    };
                    info!("Using in-memory ledger and user directory");
                    (
                        Catalog::load(&store).await?,
                        Arc::new(MemoryLedger::new()) as Arc<dyn Ledger>,
                        Arc::new(MemoryUserDirectory::new()) as Arc<dyn UserDirectory>,
                    )
                }
                StorageBackend::Postgres => {
                    let url = config.database.url.as_deref().context("DATABASE_URL must be set")?;
                    let db = Database::new(url, config.database.pool_size).await?;
                    info!("Database connected");
                    db.run_migrations().await?;

                    let store = db.catalog();
                    if let Some(path) = &config.storage.catalog_path {
                        let seed = StaticCatalogStore::from_json_file(path).await?;
                        store.import(&seed.load_movies().await?).await?;
                    }
                    (
                        Catalog::load(&store).await?,
                        Arc::new(db.ledger(grid)) as Arc<dyn Ledger>,
                        Arc::new(db.users()) as Arc<dyn UserDirectory>,
                    )
                }
            };

        let cache = match &config.redis.url {
            Some(url) => match CacheService::connect(url, config.redis.seat_cache_ttl_seconds).await {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!("Redis unavailable, seat map cache disabled: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(Self::from_parts(config, catalog, ledger, users, grid, cache))
    }

    pub fn from_parts(
        config: Config,
        catalog: Catalog,
        ledger: Arc<dyn Ledger>,
        users: Arc<dyn UserDirectory>,
        grid: SeatGrid,
        cache: Option<CacheService>,
    ) -> Arc<Self> {
        let catalog = Arc::new(catalog);
        let policy = ReservationPolicy::from(&config.reservation);
        let engine = ReservationEngine::new(catalog.clone(), ledger, grid, policy);
        Arc::new(Self {
            config,
            catalog,
            engine,
            accounts: Accounts::new(users),
            cache,
        })
    }
}
