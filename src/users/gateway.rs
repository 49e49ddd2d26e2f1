//! HTTP access to the users collection. Endpoint paths live here; the
//! backend owns storage and authorization.

use crate::users::types::{Draft, User};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info_span, Instrument};
use url::Url;

/// Maximum number of error body characters kept in a [`TransportError`].
const MAX_ERROR_CHARS: usize = 200;

/// Any failure reaching the server or receiving a non-success response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Copyable summary of a [`TransportError`], kept in store state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    Status(u16),
    Decode,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => f.write_str("unable to reach the server"),
            Self::Timeout => f.write_str("request timed out"),
            Self::Status(status) => write!(f, "server responded with {status}"),
            Self::Decode => f.write_str("unexpected response from the server"),
        }
    }
}

impl TransportError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Client(_) => ErrorKind::Network,
            Self::Request { source, .. } if source.is_timeout() => ErrorKind::Timeout,
            Self::Request { .. } => ErrorKind::Network,
            Self::Status { status, .. } => ErrorKind::Status(*status),
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }
}

/// The two logical operations the store needs from the backend.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch the whole collection in server order.
    async fn list(&self) -> Result<Vec<User>, TransportError>;

    /// Create one record. The response body is ignored.
    async fn create(&self, draft: &Draft) -> Result<(), TransportError>;
}

/// [`Gateway`] backed by `GET`/`POST {base}/users`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    users_url: String,
}

impl HttpGateway {
    /// Build a gateway for `base_url`. No timeout is applied unless one is given.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(base_url: &Url, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(crate::APP_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Client)?;

        Ok(Self {
            client,
            users_url: build_url(base_url.as_str(), "users"),
        })
    }

    #[must_use]
    pub fn users_url(&self) -> &str {
        &self.users_url
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list(&self) -> Result<Vec<User>, TransportError> {
        let span = info_span!("users.list", http.method = "GET", url = %self.users_url);
        let response = self
            .client
            .get(&self.users_url)
            .send()
            .instrument(span)
            .await
            .map_err(|source| TransportError::Request {
                endpoint: self.users_url.clone(),
                source,
            })?;

        let response = check_status(&self.users_url, response).await?;

        let users: Vec<User> =
            response
                .json()
                .await
                .map_err(|source| TransportError::Decode {
                    endpoint: self.users_url.clone(),
                    source,
                })?;

        debug!("listed {} users", users.len());

        Ok(users)
    }

    async fn create(&self, draft: &Draft) -> Result<(), TransportError> {
        let span = info_span!("users.create", http.method = "POST", url = %self.users_url);
        let response = self
            .client
            .post(&self.users_url)
            .json(draft)
            .send()
            .instrument(span)
            .await
            .map_err(|source| TransportError::Request {
                endpoint: self.users_url.clone(),
                source,
            })?;

        check_status(&self.users_url, response).await?;

        Ok(())
    }
}

/// Joins a base URL and a relative path with exactly one slash.
fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');

    if base.is_empty() {
        format!("/{path}")
    } else {
        format!("{base}/{path}")
    }
}

async fn check_status(endpoint: &str, response: Response) -> Result<Response, TransportError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    Err(TransportError::Status {
        endpoint: endpoint.to_string(),
        status,
        body: sanitize_body(&body),
    })
}

/// Trims and truncates an error body so logs stay readable.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
