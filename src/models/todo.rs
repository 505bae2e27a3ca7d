use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

const TODO_COLUMNS: &str = "id, user_id, title, description, completed, created_at, updated_at";

/// Input for creating or updating a todo.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TodoInput {
    /// Must be between 1 and 255 characters.
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub title: String,

    /// Optional; an absent description is stored as an empty string.
    pub description: Option<String>,
}

/// A todo item as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i32,
    /// Owner of the todo; fixed at creation.
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Bumped by every update and toggle.
    pub updated_at: DateTime<Utc>,
}

// Every statement below that addresses a single todo filters on both `id` and
// `user_id`, so a todo owned by someone else behaves exactly like a missing one.
impl Todo {
    pub async fn create(pool: &PgPool, user_id: i32, input: &TodoInput) -> Result<Todo, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (user_id, title, description) VALUES ($1, $2, $3) RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(user_id)
        .bind(&input.title)
        .bind(input.description.as_deref().unwrap_or(""))
        .fetch_one(pool)
        .await
    }

    /// Lists the user's todos, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: i32) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            TODO_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_owned(pool: &PgPool, id: i32, user_id: i32) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE id = $1 AND user_id = $2",
            TODO_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Overwrites title and description.
    pub async fn update_owned(
        pool: &PgPool,
        id: i32,
        user_id: i32,
        input: &TodoInput,
    ) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET title = $1, description = $2, updated_at = NOW()
             WHERE id = $3 AND user_id = $4
             RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(&input.title)
        .bind(input.description.as_deref().unwrap_or(""))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Flips `completed` in a single statement so concurrent toggles cannot lose an update.
    pub async fn toggle_owned(pool: &PgPool, id: i32, user_id: i32) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET completed = NOT completed, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Returns `false` when nothing was deleted.
    pub async fn delete_owned(pool: &PgPool, id: i32, user_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_input_validation() {
        let valid = TodoInput {
            title: "buy milk".into(),
            description: None,
        };
        assert!(valid.validate().is_ok());

        let empty_description = TodoInput {
            title: "buy milk".into(),
            description: Some(String::new()),
        };
        assert!(empty_description.validate().is_ok());

        let empty_title = TodoInput {
            title: "".into(),
            description: Some("Test Description".into()),
        };
        assert!(
            empty_title.validate().is_err(),
            "Validation should fail for empty title."
        );

        let long_title = TodoInput {
            title: "a".repeat(256),
            description: None,
        };
        assert!(
            long_title.validate().is_err(),
            "Validation should fail for overly long title."
        );
    }

    #[test]
    fn test_todo_input_description_is_optional_in_json() {
        let input: TodoInput = serde_json::from_str(r#"{"title":"buy milk"}"#).unwrap();
        assert_eq!(input.title, "buy milk");
        assert!(input.description.is_none());
    }
}
