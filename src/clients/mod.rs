/*!
 * # Klarna Payments API client
 *
 * The service talks to Klarna exclusively through [`KlarnaPaymentsApi`], so the
 * HTTP transport can be swapped for a recording fake in tests.
 */

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CreateOrderResponse, CreateSessionResponse, Session};

pub use http::{HttpKlarnaPaymentsApi, PLAYGROUND_API_URL, PRODUCTION_API_URL};

/// Errors returned by the Klarna Payments API
#[derive(Debug, Error)]
pub enum KlarnaApiError {
    /// The session or authorization does not exist (expired or never created)
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Klarna returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

impl KlarnaApiError {
    /// True when the stored session id no longer refers to a live session
    pub fn is_stale_session(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for KlarnaApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait KlarnaPaymentsApi: Send + Sync {
    async fn create_session(
        &self,
        session: &Session,
    ) -> Result<CreateSessionResponse, KlarnaApiError>;

    async fn update_session(&self, session_id: &str, session: &Session)
        -> Result<(), KlarnaApiError>;

    async fn get_session(&self, session_id: &str) -> Result<Session, KlarnaApiError>;

    async fn create_order(
        &self,
        authorization_token: &str,
        session: &Session,
    ) -> Result<CreateOrderResponse, KlarnaApiError>;

    async fn cancel_authorization(&self, authorization_token: &str) -> Result<(), KlarnaApiError>;
}
