use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

pub async fn init_db(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| {
            anyhow::anyhow!("Postgres connection failed (check DATABASE_URL/password): {e}")
        })?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Connected to database!");
    Ok(pool)
}
