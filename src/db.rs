//! Connection pool construction and schema bootstrap.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Names PostgreSQL gives the `UNIQUE` columns of `users`.
pub const USER_UNIQUE_CONSTRAINTS: &[&str] = &["users_email_key", "users_username_key"];

/// Idempotent DDL applied at startup, in dependency order.
pub const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            username VARCHAR(50) UNIQUE NOT NULL,
            email VARCHAR(100) UNIQUE NOT NULL,
            password VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "todos",
        "CREATE TABLE IF NOT EXISTS todos (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title VARCHAR(255) NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            completed BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "logs",
        "CREATE TABLE IF NOT EXISTS logs (
            id SERIAL PRIMARY KEY,
            level VARCHAR(20) NOT NULL,
            message TEXT NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "idx_todos_user_id",
        "CREATE INDEX IF NOT EXISTS idx_todos_user_id ON todos(user_id)",
    ),
];

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
}

/// Creates any missing tables and indexes.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for (name, statement) in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
        log::info!("schema object '{}' ready", name);
    }
    Ok(())
}
