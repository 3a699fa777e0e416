use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{KlarnaApiError, KlarnaPaymentsApi};
use crate::{
    config::KlarnaConfig,
    models::{CreateOrderResponse, CreateSessionResponse, Session},
};

pub const PRODUCTION_API_URL: &str = "https://api.klarna.com";
pub const PLAYGROUND_API_URL: &str = "https://api.playground.klarna.com";

/// Error body Klarna attaches to non-2xx responses
#[derive(Debug, Deserialize)]
struct KlarnaErrorBody {
    error_code: Option<String>,
    #[serde(default)]
    error_messages: Vec<String>,
    correlation_id: Option<String>,
}

/// reqwest-backed Klarna Payments API client using merchant basic auth
#[derive(Clone)]
pub struct HttpKlarnaPaymentsApi {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpKlarnaPaymentsApi {
    pub fn new(config: &KlarnaConfig) -> Result<Self, KlarnaApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &KlarnaConfig) -> Self {
        Self {
            client,
            base_url: config.api_base_url().trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/payments/v1/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, KlarnaApiError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        debug!(%status, resource, "Klarna responded");

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(KlarnaApiError::NotFound(resource.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(KlarnaApiError::Status {
            status: status.as_u16(),
            message: describe_error(&body),
        })
    }
}

fn describe_error(body: &str) -> String {
    match serde_json::from_str::<KlarnaErrorBody>(body) {
        Ok(parsed) => {
            let mut message = parsed.error_code.unwrap_or_else(|| "UNKNOWN".to_string());
            if !parsed.error_messages.is_empty() {
                message.push_str(": ");
                message.push_str(&parsed.error_messages.join("; "));
            }
            if let Some(correlation_id) = parsed.correlation_id {
                message.push_str(&format!(" (correlation id {})", correlation_id));
            }
            message
        }
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl KlarnaPaymentsApi for HttpKlarnaPaymentsApi {
    #[instrument(skip(self, session), fields(country = %session.purchase_country))]
    async fn create_session(
        &self,
        session: &Session,
    ) -> Result<CreateSessionResponse, KlarnaApiError> {
        let request = self.client.post(self.endpoint("sessions")).json(session);
        let response = self.send(request, "sessions").await?;
        Ok(response.json::<CreateSessionResponse>().await?)
    }

    #[instrument(skip(self, session))]
    async fn update_session(
        &self,
        session_id: &str,
        session: &Session,
    ) -> Result<(), KlarnaApiError> {
        let resource = format!("sessions/{}", session_id);
        let request = self.client.post(self.endpoint(&resource)).json(session);
        self.send(request, &resource).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Session, KlarnaApiError> {
        let resource = format!("sessions/{}", session_id);
        let request = self.client.get(self.endpoint(&resource));
        let response = self.send(request, &resource).await?;
        Ok(response.json::<Session>().await?)
    }

    #[instrument(skip(self, authorization_token, session))]
    async fn create_order(
        &self,
        authorization_token: &str,
        session: &Session,
    ) -> Result<CreateOrderResponse, KlarnaApiError> {
        let resource = format!("authorizations/{}/order", authorization_token);
        let request = self.client.post(self.endpoint(&resource)).json(session);
        let response = self.send(request, "authorizations/order").await?;
        Ok(response.json::<CreateOrderResponse>().await?)
    }

    #[instrument(skip(self, authorization_token))]
    async fn cancel_authorization(&self, authorization_token: &str) -> Result<(), KlarnaApiError> {
        let resource = format!("authorizations/{}", authorization_token);
        let request = self.client.delete(self.endpoint(&resource));
        self.send(request, "authorizations").await?;
        Ok(())
    }
}
