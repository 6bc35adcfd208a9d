use basket_buddy::api;
use basket_buddy::config::{database, settings};
use basket_buddy::errors::Result;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Settings file plus environment overrides
    let settings = settings::load_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Open the database and make sure every table exists
    database::ensure_sqlite_dir(&settings.database_url)?;
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect_err(|e| error!("Failed to open database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))?;

    // 5. Serve until Ctrl-C
    api::serve(&settings, db).await
}
