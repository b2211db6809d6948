//! Identity provider seam: credential checks, sign-up and token lookup.
//!
//! Implementations are stateless. The signed-in session of an interactive
//! caller lives in [`AuthClient`], which is what session-change listeners
//! subscribe to.

pub mod client;
pub mod gotrue;
pub mod jwt;
pub mod memory;

pub use client::{AuthClient, AuthEvent};
pub use gotrue::GoTrueProvider;
pub use jwt::{Claims, JwtKeys};
pub use memory::MemoryIdentityProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    /// Message from the provider, shown to the user unchanged.
    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider unavailable: {0}")]
    Transport(String),

    #[error("Invalid access token: {0}")]
    InvalidToken(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Issues credentials for a new principal. Touches no caller session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError>;
}
