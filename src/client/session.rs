use std::io;
use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiClient, ClientError};
use crate::auth::SigninResponse;
use crate::models::PublicUser;

/// The signed-in identity, persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
pub struct ResetTokenResponse {
    pub message: String,
    #[serde(rename = "resetToken")]
    pub reset_token: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Client-side session state backed by a JSON file.
pub struct SessionStore {
    client: ApiClient,
    path: PathBuf,
    session: Option<Session>,
}

impl SessionStore {
    /// Restores a persisted session from `path`. A missing or unreadable file
    /// leaves the store signed out.
    pub async fn open(mut client: ApiClient, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = load(&path).await;
        client.set_token(session.as_ref().map(|s| s.token.clone()));
        Self {
            client,
            path,
            session,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// A client carrying the current session's token, for use by other stores.
    pub fn client(&self) -> ApiClient {
        self.client.clone()
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SignupResponse, ClientError> {
        self.client
            .post(
                "/users/signup",
                &json!({ "username": username, "email": email, "password": password }),
            )
            .await
            .map_err(|e| e.with_fallback("Signup failed"))
    }

    /// Signs in and persists the session. The previous session, if any, is replaced.
    pub async fn signin(&mut self, email: &str, password: &str) -> Result<&Session, ClientError> {
        let response: SigninResponse = self
            .client
            .post("/users/signin", &json!({ "email": email, "password": password }))
            .await
            .map_err(|e| match e.status() {
                Some(StatusCode::UNAUTHORIZED) => ClientError::Api {
                    status: StatusCode::UNAUTHORIZED,
                    message: Some("Invalid email or password".into()),
                },
                _ => e.with_fallback("Signin failed"),
            })?;

        let session = Session {
            user: response.user,
            token: response.token,
        };
        tokio::fs::write(&self.path, serde_json::to_vec(&session)?).await?;

        self.client.set_token(Some(session.token.clone()));
        Ok(self.session.insert(session))
    }

    /// Forgets the session in memory and on disk. Memory is cleared even when the
    /// file cannot be removed.
    pub async fn signout(&mut self) -> Result<(), ClientError> {
        self.session = None;
        self.client.set_token(None);

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn forgot_password(&self, email: &str) -> Result<ResetTokenResponse, ClientError> {
        self.client
            .post("/users/forgot-password", &json!({ "email": email }))
            .await
            .map_err(|e| e.with_fallback("Failed to send reset password email"))
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ClientError> {
        self.client
            .post(
                "/users/reset-password",
                &json!({ "token": token, "newPassword": new_password }),
            )
            .await
            .map_err(|e| e.with_fallback("Failed to reset password"))
    }
}

async fn load(path: &Path) -> Option<Session> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            log::warn!("could not read session file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(e) => {
            log::warn!("ignoring corrupt session file {}: {}", path.display(), e);
            None
        }
    }
}
