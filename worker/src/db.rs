use anyhow::Result;
use bb8_postgres::PostgresConnectionManager;
use tokio_postgres::NoTls;

use crate::repos::weather_results::{self, WeatherTable};

pub type Pool = bb8::Pool<PostgresConnectionManager<NoTls>>;
pub type Client<'a> = bb8::PooledConnection<'a, PostgresConnectionManager<NoTls>>;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

pub async fn pool(config: tokio_postgres::Config) -> Result<Pool> {
    let mgr = PostgresConnectionManager::new(config, NoTls);
    let pool = bb8::Pool::builder().max_size(2).build(mgr).await?;
    Ok(pool)
}

/// Runs the embedded migrations, then creates the configured weather table.
pub async fn migrate(pool: &Pool, table: &WeatherTable) -> Result<()> {
    let mut conn = pool.dedicated_connection().await?;
    log::info!("Running migrations");
    let report = embedded::migrations::runner().run_async(&mut conn).await?;
    for migration in report.applied_migrations() {
        log::info!("Applied {}", migration);
    }
    drop(conn);

    let conn = pool.get().await?;
    weather_results::create_table(&conn, table).await?;
    log::info!("Weather table {} ready", table);
    Ok(())
}

/// Drops the weather table and migration history, then migrates again.
/// Activity tables are left untouched.
pub async fn reset(pool: &Pool, table: &WeatherTable) -> Result<()> {
    let conn = pool.get().await?;
    conn.batch_execute(&format!(
        "DROP TABLE IF EXISTS {} CASCADE; DROP TABLE IF EXISTS refinery_schema_history;",
        table
    ))
    .await?;
    drop(conn);
    migrate(pool, table).await
}
