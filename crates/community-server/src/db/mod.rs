//! Database pool setup and migrations

pub mod queries;
pub mod schema;

use anyhow::Result;
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

pub type DbPool = Pool;

const DB_NAME: &str = "web3_community";

/// Initialize the community database.
/// Creates it if missing, then applies migrations.
pub async fn init_db(base_url: &str) -> Result<DbPool> {
    let base_url = strip_database_path(base_url);

    // Connect to the postgres database to create ours if needed
    let admin_pool = create_lazy_pool(&format!("{}/postgres", base_url))?;
    let admin_client = admin_pool.get().await?;

    let row = admin_client
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&DB_NAME])
        .await?;

    if row.is_none() {
        admin_client
            .execute(&format!("CREATE DATABASE {}", DB_NAME), &[])
            .await?;
        info!("Created database: {}", DB_NAME);
    }

    let pool = create_lazy_pool(&format!("{}/{}", base_url, DB_NAME))?;

    let client = pool.get().await?;
    schema::run_migrations(&client).await?;

    info!("Database initialized: {}", DB_NAME);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_database_path() {
        assert_eq!(
            strip_database_path("postgres://u:p@localhost:5432/postgres"),
            "postgres://u:p@localhost:5432"
        );
        assert_eq!(
            strip_database_path("postgres://u:p@localhost:5432"),
            "postgres://u:p@localhost:5432"
        );
    }
}

/// Drop a trailing database name from a connection URL, keeping the
/// scheme and authority (e.g. `postgres://u:p@host:5432/postgres` ->
/// `postgres://u:p@host:5432`).
fn strip_database_path(url: &str) -> &str {
    let authority_start = match url.find("://") {
        Some(i) => i + 3,
        None => 0,
    };
    match url[authority_start..].find('/') {
        Some(j) => &url[..authority_start + j],
        None => url,
    }
}

/// Build a pool without opening any connection. Connections are checked
/// out lazily on first use.
pub fn create_lazy_pool(database_url: &str) -> Result<DbPool> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
    Ok(pool)
}
