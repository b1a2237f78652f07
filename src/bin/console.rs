use tokio::io::{self, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showtime_booking::{config::Config, console::Console, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // stdout belongs to the menu
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let state = AppState::new(config).await?;
    let mut console = Console::new(BufReader::new(io::stdin()), io::stdout(), state);
    console.run().await?;
    Ok(())
}
