use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// A user row, including the password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// bcrypt hash of the user's password.
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// The projection of a user that is returned to clients and attached to
/// authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

impl User {
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists_with_email_or_username(
        pool: &PgPool,
        email: &str,
        username: &str,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query_as::<_, (i32,)>(
            "SELECT id FROM users WHERE email = $1 OR username = $2 LIMIT 1",
        )
        .bind(email)
        .bind(username)
        .fetch_optional(pool)
        .await?;
        Ok(row.is_some())
    }

    /// Inserts a new user. The unique constraints on `email` and `username`
    /// are the authoritative duplicate guard.
    pub async fn create(
        pool: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<PublicUser, sqlx::Error> {
        sqlx::query_as::<_, PublicUser>(
            "INSERT INTO users (username, email, password) VALUES ($1, $2, $3)
             RETURNING id, username, email",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    /// Replaces the stored hash. Returns `false` if the user no longer exists.
    pub async fn update_password(
        pool: &PgPool,
        user_id: i32,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user; their todos go with them through the foreign key cascade.
    pub async fn delete(pool: &PgPool, user_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl PublicUser {
    pub async fn find_by_id(pool: &PgPool, user_id: i32) -> Result<Option<PublicUser>, sqlx::Error> {
        sqlx::query_as::<_, PublicUser>("SELECT id, username, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_projection_drops_password() {
        let user = User {
            id: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "$2b$10$hash".into(),
            created_at: Utc::now(),
        };

        let public: PublicUser = user.into();
        let json = serde_json::to_value(&public).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["username"], "alice");
        assert!(json.get("password").is_none());
    }
}
