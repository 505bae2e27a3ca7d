pub mod health;
pub mod todos;
pub mod users;

use actix_web::{error, web, HttpResponse};
use serde_json::json;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers every `/api` route. Mount it inside `web::scope("/api")`.
///
/// Only the `/todos` scope is wrapped in [`AuthMiddleware`]; health and account routes
/// are public.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(health::health)
        .service(
            web::scope("/users")
                .service(users::signup)
                .service(users::signin)
                .service(users::forgot_password)
                .service(users::reset_password),
        )
        .service(
            web::scope("/todos")
                .wrap(AuthMiddleware)
                .service(todos::list_todos)
                .service(todos::create_todo)
                .service(todos::get_todo)
                .service(todos::update_todo)
                .service(todos::delete_todo)
                .service(todos::toggle_todo),
        );
}

/// Malformed or incomplete JSON bodies are reported as validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            error::JsonPayloadError::Deserialize(e) => e.to_string(),
            error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
            other => other.to_string(),
        };
        AppError::ValidationError(message).into()
    })
}

/// The only path parameter is a todo id; anything unparsable cannot name an existing todo.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound("Todo not found".into()).into())
}

/// Fallback for unmatched routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Route not found" }))
}
