pub mod extractors;
pub mod middleware;
pub mod password;
pub mod reset;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::PublicUser;

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use reset::{ResetClaim, ResetTokenError, ResetTokenStore};
pub use token::{generate_token, verify_token, Claims};

/// Payload for `POST /api/users/signup`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    /// Between 3 and 30 characters.
    #[validate(length(min = 3, max = 30, message = "must be between 3 and 30 characters"))]
    pub username: String,
    /// At most 100 characters, the width of `users.email`.
    #[validate(
        email(message = "must be a valid email"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub email: String,
    /// At least 6 characters.
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
}

/// Payload for `POST /api/users/signin`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub token: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub new_password: String,
}

/// Response body of a successful sign-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct SigninResponse {
    pub message: String,
    /// Session token to send as `Authorization: Bearer <token>`.
    pub token: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_signin_request_validation() {
        let valid = SigninRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid_email = SigninRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email.validate().is_err());

        let empty_password = SigninRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };
        assert!(empty_password.validate().is_err());
    }

    #[test]
    fn test_signup_request_validation() {
        let valid = SignupRequest {
            username: "test_user-123".to_string(),
            email: "test@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(valid.validate().is_ok());

        for username in ["John Doe", "alice.smith"] {
            let spaced_or_dotted = SignupRequest {
                username: username.to_string(),
                email: "test@example.com".to_string(),
                password: "secret1".to_string(),
            };
            assert!(spaced_or_dotted.validate().is_ok(), "{} rejected", username);
        }

        let long_email = SignupRequest {
            username: "alice".to_string(),
            email: format!("{}@{}.com", "a".repeat(60), "b".repeat(56)),
            password: "secret1".to_string(),
        };
        assert_eq!(long_email.email.len(), 121);
        assert!(long_email.validate().is_err());

        let short_username = SignupRequest {
            username: "tu".to_string(),
            email: "test@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(short_username.validate().is_err());

        let long_username = SignupRequest {
            username: "a".repeat(31),
            email: "test@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(long_username.validate().is_err());

        let short_password = SignupRequest {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "12345".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_reset_password_request_uses_camel_case() {
        let request: ResetPasswordRequest =
            serde_json::from_str(r#"{"token":"abc","newPassword":"secret2"}"#).unwrap();
        assert_eq!(request.token, "abc");
        assert_eq!(request.new_password, "secret2");
        assert!(request.validate().is_ok());

        let short: ResetPasswordRequest =
            serde_json::from_str(r#"{"token":"abc","newPassword":"123"}"#).unwrap();
        assert!(short.validate().is_err());
    }
}
