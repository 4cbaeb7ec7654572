use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("{0}")]
    Rejected(String),
    #[error("sign-in request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected sign-in response: {0}")]
    UnexpectedResponse(String),
}

/// Base64 of `username:password` for the Basic scheme.
///
/// Latin-1 input is encoded byte for byte. Anything wider has both parts
/// percent-encoded first, which is what the identity endpoint expects from
/// browser clients.
pub fn encode_credentials(username: &str, password: &str) -> String {
    let joined = format!("{username}:{password}");
    match latin1_bytes(&joined) {
        Some(bytes) => STANDARD.encode(bytes),
        None => STANDARD.encode(format!(
            "{}:{}",
            encode_uri_component(username),
            encode_uri_component(password)
        )),
    }
}

/// Percent-encoding that leaves `!*'()` alone, matching `encodeURIComponent`.
/// `%` is always escaped first, so these sequences can only come from the
/// five characters themselves.
fn encode_uri_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%2A", "*")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}

fn latin1_bytes(value: &str) -> Option<Vec<u8>> {
    value
        .chars()
        .map(|ch| u8::try_from(u32::from(ch)).ok())
        .collect()
}

/// Reads a sign-in response body: a JSON string is the token, an object with
/// `error` is a rejection.
fn token_from_body(body: &str) -> Result<String, AuthError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(token)) if !token.is_empty() => Ok(token),
        Ok(Value::Object(map)) => match map.get("error") {
            Some(Value::String(message)) => Err(AuthError::Rejected(message.clone())),
            Some(other) => Err(AuthError::Rejected(other.to_string())),
            None => Err(AuthError::UnexpectedResponse(Value::Object(map).to_string())),
        },
        Ok(other) => Err(AuthError::UnexpectedResponse(other.to_string())),
        Err(_) => {
            let raw = body.trim();
            if raw.is_empty() || raw.contains(char::is_whitespace) {
                Err(AuthError::UnexpectedResponse(raw.to_string()))
            } else {
                Ok(raw.to_string())
            }
        }
    }
}

/// Exchanges credentials for a bearer token at the identity endpoint.
pub async fn sign_in(client: &Client, url: &str, credentials: &Credentials) -> Result<String, AuthError> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    debug!(%url, username = %credentials.username, "signing in");
    let response = client
        .post(url)
        .header(
            reqwest::header::AUTHORIZATION,
            format!(
                "Basic {}",
                encode_credentials(&credentials.username, &credentials.password)
            ),
        )
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    let result = token_from_body(&body);
    if result.is_err() {
        warn!(status = status.as_u16(), "sign-in was not accepted");
    }
    result
}
