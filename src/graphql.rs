use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum GraphqlError {
    #[error("session is no longer valid: {0}")]
    Unauthenticated(String),
    #[error("graphql request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("graphql endpoint answered {0}")]
    Status(u16),
    #[error("graphql errors: {}", .0.join(", "))]
    Query(Vec<String>),
    #[error("malformed graphql payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("graphql response carried no data")]
    MissingData,
}

impl GraphqlError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, GraphqlError::Unauthenticated(_))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<ErrorEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorExtensions {
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorEntry {
    fn signals_expired_session(&self) -> bool {
        let code = self
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.code.as_deref());
        if matches!(code, Some("invalid-jwt" | "invalid-headers")) {
            return true;
        }
        let message = self.message.to_ascii_lowercase();
        message.contains("jwtexpired") || message.contains("could not verify jwt")
    }
}

/// Maps a decoded `{data, errors}` envelope to data or a classified error.
fn classify(envelope: Envelope) -> Result<Value, GraphqlError> {
    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        if let Some(expired) = errors.iter().find(|entry| entry.signals_expired_session()) {
            return Err(GraphqlError::Unauthenticated(expired.message.clone()));
        }
        return Err(GraphqlError::Query(
            errors.into_iter().map(|entry| entry.message).collect(),
        ));
    }
    envelope.data.ok_or(GraphqlError::MissingData)
}

/// Non-2xx answers are `Status` unless their body reports an expired token.
fn failed_status(status: StatusCode, body: &[u8]) -> GraphqlError {
    let expired = serde_json::from_slice::<Envelope>(body)
        .ok()
        .and_then(|envelope| envelope.errors)
        .and_then(|errors| errors.into_iter().find(ErrorEntry::signals_expired_session));
    match expired {
        Some(entry) => GraphqlError::Unauthenticated(entry.message),
        None => GraphqlError::Status(status.as_u16()),
    }
}

/// Thin client for the platform GraphQL endpoint. It never retries and sets no
/// timeout of its own.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    client: Client,
    endpoint: String,
}

impl GraphqlClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        token: &str,
    ) -> Result<T, GraphqlError> {
        debug!(endpoint = %self.endpoint, "sending graphql query");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GraphqlError::Unauthenticated(format!("http {}", status.as_u16())));
        }

        if !status.is_success() {
            return Err(failed_status(status, &body));
        }

        let envelope: Envelope = serde_json::from_slice(&body)?;

        let data = classify(envelope)?;
        Ok(serde_json::from_value(data)?)
    }
}
