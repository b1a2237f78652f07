use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showtime_booking::{config::Config, controllers, AppState};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!("Starting Showtime Booking API ({})", config.app.environment);

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port).parse()?;
    let app_state = AppState::new(config).await?;
    info!(
        "Catalog ready: {} movies, {} seats per showtime",
        app_state.catalog.movies().len(),
        app_state.engine.grid().capacity()
    );

    let app = controllers::app(app_state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
