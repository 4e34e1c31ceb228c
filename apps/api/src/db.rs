use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

/// Creates a PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}

/// True when `err` is a Postgres unique-constraint violation on `constraint`.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// True when every id in `ids` names a row of `table` owned by `user_id`.
/// `table` must be one of our own table names, never caller input.
pub async fn all_owned(
    conn: &mut PgConnection,
    table: &'static str,
    user_id: Uuid,
    ids: &[Uuid],
) -> Result<bool, sqlx::Error> {
    if ids.is_empty() {
        return Ok(true);
    }
    let mut distinct = ids.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let sql = format!("SELECT COUNT(*) FROM {table} WHERE user_id = $1 AND id = ANY($2)");
    let found: i64 = sqlx::query_scalar(&sql)
        .bind(user_id)
        .bind(&distinct)
        .fetch_one(&mut *conn)
        .await?;
    Ok(found == distinct.len() as i64)
}
