use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::info;

use super::{AuthError, AuthSession, AuthUser, IdentityProvider};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
}

impl AuthEvent {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthEvent::SignedIn(user) => Some(user),
            AuthEvent::SignedOut => None,
        }
    }
}

/// Holds the signed-in session of one interactive caller and broadcasts
/// every change to it.
pub struct AuthClient {
    provider: Arc<dyn IdentityProvider>,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { provider, session: RwLock::new(None), events }
    }

    /// The stateless provider behind this client. Used for credential
    /// issuance that must not disturb the current session.
    pub fn provider(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.provider)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub async fn current_session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        *self.session.write().await = Some(session.clone());
        info!(user_id = %session.user.id, "signed in");
        self.notify(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    pub async fn sign_out(&self) {
        let previous = self.session.write().await.take();
        if let Some(session) = previous {
            info!(user_id = %session.user.id, "signed out");
        }
        self.notify(AuthEvent::SignedOut);
    }

    fn notify(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
