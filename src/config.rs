use std::env;
use std::fmt;
use std::str::FromStr;

/// Signing key used when `JWT_SECRET` is not configured. Only suitable for local development.
pub const FALLBACK_JWT_SECRET: &str = "fallback_secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither `DATABASE_URL` nor the `PG_*` connection variables were provided.
    MissingDatabaseUrl,
    /// A variable was present but could not be parsed into the expected type.
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL (or PG_HOST/PG_USER/PG_DATABASE) must be set")
            }
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value '{}'", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for session tokens, reset tokens and password hashing.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn uses_fallback_secret(&self) -> bool {
        self.jwt_secret == FALLBACK_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: FALLBACK_JWT_SECRET.to_string(),
            token_ttl_seconds: 60 * 60,
            reset_token_ttl_seconds: 60 * 60,
            bcrypt_cost: 10,
        }
    }
}

pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => database_url_from_parts(&lookup)?,
        };

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            jwt_secret: lookup("JWT_SECRET")
                .filter(|secret| !secret.is_empty())
                .unwrap_or(defaults.jwt_secret),
            token_ttl_seconds: parse_or(&lookup, "JWT_TTL_SECONDS", defaults.token_ttl_seconds)?,
            reset_token_ttl_seconds: parse_or(
                &lookup,
                "RESET_TOKEN_TTL_SECONDS",
                defaults.reset_token_ttl_seconds,
            )?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
        };

        // SERVER_PORT wins over the conventional PORT variable.
        let server_port = match lookup("SERVER_PORT") {
            Some(_) => parse_or(&lookup, "SERVER_PORT", 5000)?,
            None => parse_or(&lookup, "PORT", 5000)?,
        };

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            server_port,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            auth,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn database_url_from_parts<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("PG_HOST").ok_or(ConfigError::MissingDatabaseUrl)?;
    let user = lookup("PG_USER").ok_or(ConfigError::MissingDatabaseUrl)?;
    let database = lookup("PG_DATABASE").ok_or(ConfigError::MissingDatabaseUrl)?;
    let port: u16 = parse_or(lookup, "PG_PORT", 5432)?;

    let credentials = match lookup("PG_PASSWORD") {
        Some(password) => format!("{}:{}", user, password),
        None => user,
    };
    Ok(format!(
        "postgres://{}@{}:{}/{}",
        credentials, host, port, database
    ))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
