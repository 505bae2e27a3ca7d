//! Typed HTTP client for the todo API.
//!
//! [`ApiClient`] speaks the `/api` JSON contract; [`session::SessionStore`] and
//! [`todos::TodoStore`] hold client-side state on top of it.

pub mod session;
pub mod todos;

use std::fmt;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use session::{Session, SessionStore};
pub use todos::TodoStore;

/// Errors surfaced by the client library.
#[derive(Debug)]
pub enum ClientError {
    /// The server answered with a non-success status. `message` is the server's
    /// `{"message"}` body when it sent one.
    Api {
        status: StatusCode,
        message: Option<String>,
    },
    /// The request never produced a response.
    Transport(reqwest::Error),
    /// The response body did not have the expected shape.
    Decode(serde_json::Error),
    /// Reading or writing the persisted session failed.
    Storage(std::io::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server's message, or `fallback` when there is none.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Fills in `fallback` for API errors that arrived without a message.
    pub fn with_fallback(self, fallback: &str) -> Self {
        match self {
            ClientError::Api {
                status,
                message: None,
            } => ClientError::Api {
                status,
                message: Some(fallback.to_string()),
            },
            other => other,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } => write!(f, "{}", message),
            ClientError::Api {
                status,
                message: None,
            } => write!(f, "Request failed with status {}", status),
            ClientError::Transport(e) => write!(f, "Request failed: {}", e),
            ClientError::Decode(e) => write!(f, "Unexpected response from server: {}", e),
            ClientError::Storage(e) => write!(f, "Session storage error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Transport(error)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Decode(error)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> Self {
        ClientError::Storage(error)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP plumbing shared by the stores. Cloning is cheap; clones share the
/// connection pool but each carries its own bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` includes the `/api` prefix, e.g. `http://127.0.0.1:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        send(self.request(Method::GET, path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        send(self.request(Method::PATCH, path)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        send(self.request(Method::DELETE, path)).await
    }
}

async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        log::debug!("api request failed with {}: {:?}", status, message);
        return Err(ClientError::Api { status, message });
    }

    Ok(serde_json::from_str(&body)?)
}
