#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use visa_portal_api::api::{self, AppState, Backends};
use visa_portal_api::config::AppConfig;
use visa_portal_api::testing::{TestContext, FIXTURE_PASSWORD};

/// The portal API on in-memory backends, served from the calling test's
/// runtime on a free port.
pub struct TestServer {
    pub base_url: String,
    pub ctx: TestContext,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let ctx = TestContext::new();
        let config = AppConfig::from_source(|name| match name {
            "SUPABASE_URL" => Some("http://127.0.0.1:54321".to_string()),
            "SUPABASE_ANON_KEY" => Some("sb_publishable_test".to_string()),
            "API_ENABLE_REQUEST_LOGGING" => Some("false".to_string()),
            _ => None,
        })?;

        let state = AppState::new(Backends::memory(ctx.store.clone(), ctx.identity.clone()));
        let app = api::app(state, &config);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self { base_url: format!("http://127.0.0.1:{}", port), ctx, client: reqwest::Client::new() };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": FIXTURE_PASSWORD }))
            .send()
            .await?;
        let body: Value = res.json().await?;
        body["data"]["access_token"]
            .as_str()
            .map(str::to_string)
            .with_context(|| format!("login failed: {}", body))
    }

    /// Registered admin plus an access token for them.
    pub async fn admin(&self, email: &str) -> Result<(Uuid, String)> {
        let id = self.ctx.admin(email).await;
        Ok((id, self.login(email).await?))
    }

    pub async fn applicant(&self, admin_id: Uuid, email: &str, name: &str) -> Result<(Uuid, String)> {
        let id = self.ctx.applicant(admin_id, email, name).await;
        Ok((id, self.login(email).await?))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self.client.put(self.url(path)).bearer_auth(token).json(&body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self.client.post(self.url(path)).bearer_auth(token).json(&body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).bearer_auth(token).send().await?;
        Ok((res.status(), res.json().await?))
    }
}
