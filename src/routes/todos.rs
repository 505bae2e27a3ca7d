use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{LogEntry, Todo, TodoInput},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

const TODO_NOT_FOUND: &str = "Todo not found";

/// Converts a store result and appends server-side failures to the `logs` table.
async fn logged<T>(pool: &PgPool, context: &str, result: Result<T, sqlx::Error>) -> Result<T, AppError> {
    let result = result.map_err(AppError::from);
    if let Err(err) = &result {
        if err.is_server_error() {
            LogEntry::record_error(pool, context, &err.to_string()).await;
        }
    }
    result
}

/// Lists the authenticated user's todos, newest first.
///
/// ## Responses:
/// - `200 OK`: `{"todos": [Todo, ...]}`.
/// - `401 Unauthorized` / `403 Forbidden`: missing or invalid token.
#[get("")]
pub async fn list_todos(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let todos = logged(
        &pool,
        "Get all todos error",
        Todo::list_for_user(&pool, user.id()).await,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "todos": todos })))
}

/// Creates a todo owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: 1 to 255 characters (required).
/// - `description` (optional): stored as an empty string when absent.
///
/// ## Responses:
/// - `201 Created`: `{"message": ..., "todo": Todo}` with `completed = false`.
/// - `400 Bad Request`: validation failure.
#[post("")]
pub async fn create_todo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    payload: web::Json<TodoInput>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let todo = logged(
        &pool,
        "Create todo error",
        Todo::create(&pool, user.id(), &payload).await,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Todo created successfully",
        "todo": todo
    })))
}

/// Retrieves one todo.
///
/// ## Responses:
/// - `200 OK`: `{"todo": Todo}`.
/// - `404 Not Found`: the todo does not exist or belongs to another user.
#[get("/{id}")]
pub async fn get_todo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    todo_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let todo = logged(
        &pool,
        "Get todo by id error",
        Todo::find_owned(&pool, todo_id.into_inner(), user.id()).await,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(TODO_NOT_FOUND.into()))?;

    Ok(HttpResponse::Ok().json(json!({ "todo": todo })))
}

/// Replaces a todo's title and description.
///
/// Both fields are overwritten; an omitted description becomes empty.
///
/// ## Responses:
/// - `200 OK`: `{"message": ..., "todo": Todo}`.
/// - `400 Bad Request`: validation failure.
/// - `404 Not Found`: the todo does not exist or belongs to another user.
#[put("/{id}")]
pub async fn update_todo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    todo_id: web::Path<i32>,
    payload: web::Json<TodoInput>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let todo = logged(
        &pool,
        "Update todo error",
        Todo::update_owned(&pool, todo_id.into_inner(), user.id(), &payload).await,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(TODO_NOT_FOUND.into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Todo updated successfully",
        "todo": todo
    })))
}

/// Deletes a todo.
///
/// ## Responses:
/// - `200 OK`: `{"message": ...}`.
/// - `404 Not Found`: the todo does not exist or belongs to another user.
#[delete("/{id}")]
pub async fn delete_todo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    todo_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let deleted = logged(
        &pool,
        "Delete todo error",
        Todo::delete_owned(&pool, todo_id.into_inner(), user.id()).await,
    )
    .await?;

    if !deleted {
        return Err(AppError::NotFound(TODO_NOT_FOUND.into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Todo deleted successfully" })))
}

/// Flips a todo's `completed` flag.
///
/// ## Responses:
/// - `200 OK`: `{"message": ..., "todo": Todo}`.
/// - `404 Not Found`: the todo does not exist or belongs to another user.
#[patch("/{id}/toggle")]
pub async fn toggle_todo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    todo_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let todo = logged(
        &pool,
        "Toggle todo completion error",
        Todo::toggle_owned(&pool, todo_id.into_inner(), user.id()).await,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(TODO_NOT_FOUND.into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Todo completion status updated",
        "todo": todo
    })))
}
