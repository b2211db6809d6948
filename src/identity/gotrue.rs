use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::{AuthError, AuthSession, AuthUser, IdentityProvider};

/// Hosted auth service (GoTrue) over HTTP, authenticated with the project's
/// public API key.
#[derive(Clone)]
pub struct GoTrueProvider {
    http: Client,
    auth_url: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(flatten)]
    bare: Option<AuthUser>,
}

impl GoTrueProvider {
    pub fn new(endpoint: &Url, api_key: impl Into<String>) -> Result<Self, AuthError> {
        let mut base = endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let auth_url = base
            .join("auth/v1/")
            .map_err(|e| AuthError::Transport(format!("invalid auth endpoint: {}", e)))?;
        Ok(Self { http: Client::new(), auth_url, api_key: api_key.into() })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.auth_url
            .join(path)
            .map_err(|e| AuthError::Transport(format!("invalid auth endpoint: {}", e)))
    }

    fn with_key(&self, request: RequestBuilder, bearer: &str) -> RequestBuilder {
        request.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, AuthError> {
        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<Value, AuthError> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        return Ok(body);
    }
    debug!(status = status.as_u16(), "auth service rejected request");
    Err(AuthError::Rejected(error_message(&body).unwrap_or_else(|| {
        status.canonical_reason().unwrap_or("Authentication failed").to_string()
    })))
}

/// The service reports errors under different keys depending on endpoint
/// and version.
fn error_message(body: &Value) -> Option<String> {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, AuthError> {
    serde_json::from_value(body).map_err(|e| AuthError::Transport(format!("unexpected auth response: {}", e)))
}

#[async_trait]
impl IdentityProvider for GoTrueProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let url = self.endpoint("token?grant_type=password")?;
        let request = self
            .with_key(self.http.post(url), &self.api_key)
            .json(&json!({ "email": email, "password": password }));
        decode(self.send(request).await?)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let url = self.endpoint("signup")?;
        let request = self
            .with_key(self.http.post(url), &self.api_key)
            .json(&json!({ "email": email, "password": password }));
        // With auto-confirm the service answers with a session wrapping the
        // user; otherwise with the bare user.
        let response: SignUpResponse = decode(self.send(request).await?)?;
        response
            .user
            .or(response.bare)
            .ok_or_else(|| AuthError::Transport("sign-up response carried no user".to_string()))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let url = self.endpoint("user")?;
        let request = self.with_key(self.http.get(url), access_token);
        self.send(request).await.and_then(decode).map_err(|e| match e {
            AuthError::Rejected(message) => AuthError::InvalidToken(message),
            other => other,
        })
    }
}
