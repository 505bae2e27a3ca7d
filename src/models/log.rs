use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;

/// Append-only diagnostic record stored in the `logs` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogEntry {
    pub id: i32,
    pub level: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level = match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
        };
        f.write_str(level)
    }
}

impl LogEntry {
    /// Appends a row to `logs`. Failing to write is reported through the `log`
    /// facade and otherwise ignored.
    pub async fn record(pool: &PgPool, level: LogLevel, message: &str) {
        let result = sqlx::query("INSERT INTO logs (level, message) VALUES ($1, $2)")
            .bind(level.to_string())
            .bind(message)
            .execute(pool)
            .await;

        if let Err(e) = result {
            log::warn!("failed to persist log entry '{}': {}", message, e);
        }
    }

    pub async fn record_error(pool: &PgPool, context: &str, detail: &str) {
        Self::record(pool, LogLevel::Error, &format!("{}: {}", context, detail)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert_eq!(LogLevel::Info.to_string(), "INFO");
    }
}
