use crate::{
    auth::{
        generate_token, hash_password, verify_password, ForgotPasswordRequest,
        ResetPasswordRequest, ResetTokenError, ResetTokenStore, SigninRequest, SigninResponse,
        SignupRequest,
    },
    config::AuthConfig,
    error::AppError,
    models::{PublicUser, User},
};
use actix_web::{post, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Runs bcrypt off the async worker thread.
async fn hash_off_thread(password: String, cost: u32) -> Result<String, AppError> {
    web::block(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password hashing task failed: {}", e)))?
}

async fn verify_off_thread(password: String, hash: String) -> Result<bool, AppError> {
    web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password check task failed: {}", e)))?
}

/// Create an account
///
/// Rejects the request with 400 when the email or username is already taken, either by
/// the pre-check or by the unique constraint when two signups race. The response
/// carries the public projection of the user, never the hash.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    auth: web::Data<AuthConfig>,
    payload: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let SignupRequest {
        username,
        email,
        password,
    } = payload.into_inner();

    if User::exists_with_email_or_username(&pool, &email, &username).await? {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_off_thread(password, auth.bcrypt_cost).await?;
    let user = User::create(&pool, &username, &email, &password_hash).await?;
    log::info!("created user {} ({})", user.id, user.username);

    Ok(HttpResponse::Created().json(json!({
        "message": "User created successfully",
        "user": user
    })))
}

/// Sign in
///
/// Unknown emails and wrong passwords produce the same 400 response so the endpoint
/// cannot be used to probe for accounts.
#[post("/signin")]
pub async fn signin(
    pool: web::Data<PgPool>,
    auth: web::Data<AuthConfig>,
    payload: web::Json<SigninRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let SigninRequest { email, password } = payload.into_inner();

    let user = User::find_by_email(&pool, &email)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.into()))?;

    if !verify_off_thread(password, user.password.clone()).await? {
        log::debug!("failed sign-in for user {}", user.id);
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    let token = generate_token(user.id, &user.email, &auth)?;
    Ok(HttpResponse::Ok().json(SigninResponse {
        message: "Signin successful".into(),
        token,
        user: PublicUser::from(user),
    }))
}

/// Request a password reset
///
/// The reset token is returned in the response body; there is no out-of-band delivery.
#[post("/forgot-password")]
pub async fn forgot_password(
    pool: web::Data<PgPool>,
    reset_tokens: web::Data<ResetTokenStore>,
    payload: web::Json<ForgotPasswordRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let user = User::find_by_email(&pool, &payload.email)
        .await?
        .ok_or_else(|| AppError::BadRequest("User not found".into()))?;

    let reset_token = reset_tokens.issue(user.id, Utc::now());
    log::info!("issued password reset token for user {}", user.id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password reset token generated",
        "resetToken": reset_token
    })))
}

/// Reset a password with a reset token
///
/// The token is held while the new password is hashed and stored, and deleted only
/// once the write succeeds. A failed write leaves it usable for a retry.
#[post("/reset-password")]
pub async fn reset_password(
    pool: web::Data<PgPool>,
    auth: web::Data<AuthConfig>,
    reset_tokens: web::Data<ResetTokenStore>,
    payload: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let ResetPasswordRequest {
        token,
        new_password,
    } = payload.into_inner();

    let claim = reset_tokens
        .claim(&token, Utc::now())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claim.user_id();

    let password_hash = hash_off_thread(new_password, auth.bcrypt_cost).await?;
    let updated = User::update_password(&pool, user_id, &password_hash).await?;
    // Spent whether or not the user still exists.
    claim.consume();
    if !updated {
        return Err(AppError::BadRequest(ResetTokenError::Unknown.to_string()));
    }
    log::info!("password reset for user {}", user_id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password reset successful"
    })))
}
