use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

/// Application tables, children first so drops respect foreign keys.
const APP_TABLES: &[&str] = &[
    "documents",
    "companies",
    "scopes",
    "industries",
    "nace_embeddings",
    "_sqlx_migrations",
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates every table that does not exist yet. Existing data is untouched.
pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}

/// Drops every application table. All data is lost.
pub async fn drop_db(pool: &PgPool) -> Result<()> {
    warn!("Dropping all application tables");
    for table in APP_TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table} CASCADE"))
            .execute(pool)
            .await?;
    }
    Ok(())
}
