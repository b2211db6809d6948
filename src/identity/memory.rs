use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use super::jwt::{Claims, JwtKeys, DEFAULT_AUDIENCE};
use super::{AuthError, AuthSession, AuthUser, IdentityProvider};
use crate::schema::record::is_valid_email;

const TOKEN_TTL_HOURS: i64 = 1;

struct Account {
    id: Uuid,
    password: String,
}

/// In-process provider that signs real HS256 tokens, so local verification
/// and the provider lookup agree on every token it hands out.
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    keys: JwtKeys,
}

impl MemoryIdentityProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            keys: JwtKeys::from_secret(secret, DEFAULT_AUDIENCE),
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Creates an account directly, returning its principal id.
    pub fn register(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthError::Rejected("Unable to validate email address: invalid format".to_string()));
        }
        if password.chars().count() < 6 {
            return Err(AuthError::Rejected("Password should be at least 6 characters.".to_string()));
        }
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| AuthError::Transport("account store lock poisoned".to_string()))?;
        if accounts.contains_key(&email) {
            return Err(AuthError::Rejected("User already registered".to_string()));
        }
        let id = Uuid::new_v4();
        accounts.insert(email, Account { id, password: password.to_string() });
        Ok(id)
    }

    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        self.keys.issue(&Claims::new(user, DEFAULT_AUDIENCE, Duration::hours(TOKEN_TTL_HOURS)))
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.trim().to_lowercase();
        let id = {
            let accounts = self
                .accounts
                .read()
                .map_err(|_| AuthError::Transport("account store lock poisoned".to_string()))?;
            match accounts.get(&email) {
                Some(account) if account.password == password => account.id,
                _ => return Err(AuthError::Rejected("Invalid login credentials".to_string())),
            }
        };
        let user = AuthUser { id, email: Some(email) };
        Ok(AuthSession {
            access_token: self.issue_token(&user)?,
            refresh_token: None,
            expires_in: Some(TOKEN_TTL_HOURS * 3600),
            user,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let id = self.register(email, password)?;
        Ok(AuthUser { id, email: Some(email.trim().to_lowercase()) })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.keys.verify(access_token)?;
        let known = self
            .accounts
            .read()
            .map_err(|_| AuthError::Transport("account store lock poisoned".to_string()))?
            .values()
            .any(|account| account.id == claims.sub);
        if !known {
            return Err(AuthError::InvalidToken("User from sub claim in JWT does not exist".to_string()));
        }
        Ok(claims.user())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_round_trips_through_token() {
        let provider = MemoryIdentityProvider::new("secret");
        let user = provider.sign_up("Agent@Example.com", "hunter22").await.unwrap();
        let session = provider.sign_in_with_password("agent@example.com", "hunter22").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(provider.get_user(&session.access_token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn rejections_carry_provider_messages() {
        let provider = MemoryIdentityProvider::new("secret");
        provider.sign_up("a@example.com", "secret1").await.unwrap();

        let duplicate = provider.sign_up("a@example.com", "secret1").await.unwrap_err();
        assert_eq!(duplicate.to_string(), "User already registered");

        let wrong = provider.sign_in_with_password("a@example.com", "nope").await.unwrap_err();
        assert_eq!(wrong, AuthError::Rejected("Invalid login credentials".to_string()));

        let short = provider.sign_up("b@example.com", "123").await.unwrap_err();
        assert!(short.to_string().starts_with("Password should be at least 6"));
    }
}
