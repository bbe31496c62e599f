//! Database bootstrap: create the target database and the model tables at startup.

use crate::error::AppError;
use crate::model::ModelRegistry;
use crate::sql::{create_table, quoted};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Connect to the `postgres` maintenance database on the same server and create the database
/// named in `database_url` if it does not exist.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Persistence(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| AppError::Persistence("DATABASE_URL: no scheme".into()))?;
    if !rest.contains('/') {
        return Err(AppError::Persistence("DATABASE_URL: no path".into()));
    }
    let path_start = url.rfind('/').map(|i| i + 1).unwrap_or(url.len());
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

/// `CREATE TABLE IF NOT EXISTS` for every registered model. Existing tables are left as they are.
pub async fn ensure_tables(pool: &PgPool, registry: &ModelRegistry) -> Result<(), AppError> {
    for model in registry.models() {
        let ddl = create_table(model);
        tracing::debug!(sql = %ddl, "ddl");
        sqlx::query(&ddl).execute(pool).await?;
        tracing::info!(table = %model.table_name(), model = %model.name, "table ready");
    }
    Ok(())
}
