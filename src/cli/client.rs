use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use super::config::{self, StoredSession};
use super::DEFAULT_SERVER;

/// Thin client over the portal API's JSON envelope.
pub struct PortalClient {
    http: Client,
    server: String,
    token: Option<String>,
}

impl PortalClient {
    /// Anonymous client. The server is the explicit one, else the stored
    /// session's, else the local default.
    pub fn anonymous(server: Option<String>) -> anyhow::Result<Self> {
        let stored = config::load_session()?;
        let server = server
            .or_else(|| stored.map(|s| s.server))
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        Ok(Self { http: Client::new(), server: server.trim_end_matches('/').to_string(), token: None })
    }

    /// Client carrying the stored session's token.
    pub fn authenticated(server: Option<String>) -> anyhow::Result<(Self, StoredSession)> {
        let session = config::load_session()?
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `portal auth login <email>` first."))?;
        let server = server.unwrap_or_else(|| session.server.clone());
        let client = Self {
            http: Client::new(),
            server: server.trim_end_matches('/').to_string(),
            token: Some(session.access_token.clone()),
        };
        Ok((client, session))
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::DELETE, path)).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{}", self.server, path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Unwraps `data` from a success envelope; turns an error envelope into
    /// an error carrying the server's message.
    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() && body["success"] == Value::Bool(true) {
            return Ok(body.get("data").cloned().unwrap_or(Value::Null));
        }

        let message = body["message"].as_str().unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"));
        let mut error = format!("{} ({})", message, status.as_u16());
        if let Some(fields) = body["field_errors"].as_object() {
            for (field, problem) in fields {
                error.push_str(&format!("\n  {}: {}", field, problem.as_str().unwrap_or_default()));
            }
        }
        Err(anyhow::anyhow!(error))
    }
}
