use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::accounts::{self, AccountError};
use super::{Profile, ProfileResolver};
use crate::guards::ProfileSource;
use crate::identity::{AuthClient, AuthError};
use crate::store::models::Applicant;

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileState {
    Loading,
    Ready(Option<Profile>),
}

/// Profile of one interactive caller, kept in step with its [`AuthClient`].
///
/// Each resolution takes a generation number; a result whose generation has
/// been superseded is dropped, so a slow lookup for an old principal never
/// overwrites a newer one.
pub struct SessionContext {
    auth: Arc<AuthClient>,
    resolver: ProfileResolver,
    state: watch::Sender<ProfileState>,
    generation: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionContext {
    /// Subscribes to session changes, then resolves whatever session the
    /// client already holds. The returned context is never left `Loading`.
    pub async fn start(auth: Arc<AuthClient>, resolver: ProfileResolver) -> Arc<Self> {
        let (state, _) = watch::channel(ProfileState::Loading);
        let context = Arc::new(Self {
            auth,
            resolver,
            state,
            generation: AtomicU64::new(0),
            listener: Mutex::new(None),
        });
        let handle = context.listen();
        if let Ok(mut slot) = context.listener.lock() {
            *slot = Some(handle);
        }
        let principal = context.auth.current_user().await.map(|u| u.id);
        context.resolve(principal).await;
        context
    }

    pub fn auth(&self) -> &Arc<AuthClient> {
        &self.auth
    }

    pub fn watch(&self) -> watch::Receiver<ProfileState> {
        self.state.subscribe()
    }

    /// Re-resolves on every session change until the context is dropped.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        // Subscribe before spawning so no event between here and the first
        // poll of the task is missed.
        let mut events = self.auth.subscribe();
        let context: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let principal = match events.recv().await {
                    Ok(event) => event.user().map(|u| u.id),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session events lagged; resolving latest session");
                        match context.upgrade() {
                            Some(ctx) => ctx.auth.current_user().await.map(|u| u.id),
                            None => break,
                        }
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(ctx) = context.upgrade() else { break };
                ctx.resolve(principal).await;
            }
        })
    }

    /// Waits for the latest resolution. When it settled to `None` while the
    /// client still holds a principal, resolves once more from it.
    pub async fn current_profile(&self) -> Option<Profile> {
        if let Some(profile) = self.settled().await {
            return Some(profile);
        }
        match self.auth.current_user().await {
            Some(user) => self.resolve(Some(user.id)).await,
            None => None,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Profile>, AuthError> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        Ok(self.resolve(Some(session.user.id)).await)
    }

    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
        self.resolve(None).await;
    }

    pub async fn sign_up_admin(&self, email: &str, password: &str, full_name: &str) -> Result<Profile, AccountError> {
        let provider = self.auth.provider();
        let store = self.resolver.store();
        accounts::register_admin(provider.as_ref(), store.as_ref(), email, password, full_name).await
    }

    pub async fn sign_up_applicant(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
        admin_id: Uuid,
    ) -> Result<Applicant, AccountError> {
        let provider = self.auth.provider();
        let store = self.resolver.store();
        accounts::register_applicant(provider.as_ref(), store.as_ref(), email, password, full_name, admin_id).await
    }

    async fn settled(&self) -> Option<Profile> {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|state| matches!(state, ProfileState::Ready(_))).await {
            Ok(state) => match &*state {
                ProfileState::Ready(profile) => profile.clone(),
                ProfileState::Loading => None,
            },
            Err(_) => None,
        };
        settled
    }

    async fn resolve(&self, principal: Option<Uuid>) -> Option<Profile> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(ProfileState::Loading);
        let pending = PendingResolution { context: self, generation, settled: false };

        let profile = match principal {
            None => None,
            Some(id) => match self.resolver.resolve_profile(id).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(principal = %id, error = %e, "profile lookup failed");
                    None
                }
            },
        };

        pending.settle(profile.clone());
        profile
    }

    /// Publishes `state` unless a newer resolution has started since
    /// `generation`.
    fn publish(&self, generation: u64, state: ProfileState) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.state.send_replace(state);
        } else {
            debug!(generation, "discarding superseded profile resolution");
        }
    }
}

/// Settles one resolution. Dropped unsettled (the resolving future was
/// cancelled mid-lookup), it publishes `Ready(None)` so waiters never hang
/// on `Loading`.
struct PendingResolution<'a> {
    context: &'a SessionContext,
    generation: u64,
    settled: bool,
}

impl PendingResolution<'_> {
    fn settle(mut self, profile: Option<Profile>) {
        self.settled = true;
        self.context.publish(self.generation, ProfileState::Ready(profile));
    }
}

impl Drop for PendingResolution<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(generation = self.generation, "profile resolution cancelled");
            self.context.publish(self.generation, ProfileState::Ready(None));
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl ProfileSource for SessionContext {
    async fn current_profile(&self) -> Option<Profile> {
        SessionContext::current_profile(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityProvider;
    use crate::session::Role;
    use crate::store::models::{ADMIN_TABLE, USERS_TABLE};
    use crate::store::{MemoryStore, Store, StoreOp};
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        provider: Arc<MemoryIdentityProvider>,
        store: Arc<MemoryStore>,
        auth: Arc<AuthClient>,
    }

    impl Fixture {
        fn new(store: MemoryStore) -> Self {
            let provider = Arc::new(MemoryIdentityProvider::new("secret"));
            let auth = Arc::new(AuthClient::new(provider.clone()));
            Self { provider, store: Arc::new(store), auth }
        }

        async fn admin(&self, email: &str) -> Uuid {
            let id = self.provider.register(email, "secret1").unwrap();
            let row = json!({"id": id, "full_name": "Agent"}).as_object().cloned().unwrap();
            self.store.insert_many(ADMIN_TABLE, vec![row]).await.unwrap();
            id
        }

        async fn applicant(&self, email: &str, admin_id: Uuid) -> Uuid {
            let id = self.provider.register(email, "secret1").unwrap();
            let row = json!({"id": id, "full_name": "Ana", "admin_id": admin_id}).as_object().cloned().unwrap();
            self.store.insert_many(USERS_TABLE, vec![row]).await.unwrap();
            id
        }

        async fn context(&self) -> Arc<SessionContext> {
            SessionContext::start(self.auth.clone(), ProfileResolver::new(self.store.clone())).await
        }
    }

    fn state_of(context: &SessionContext) -> ProfileState {
        context.state.borrow().clone()
    }

    #[tokio::test]
    async fn starts_ready_without_session() {
        let fixture = Fixture::new(MemoryStore::new());
        let context = fixture.context().await;
        assert_eq!(state_of(&context), ProfileState::Ready(None));
        assert_eq!(context.current_profile().await, None);
    }

    #[tokio::test]
    async fn sign_in_resolves_role() {
        let fixture = Fixture::new(MemoryStore::new());
        let admin_id = fixture.admin("agent@example.com").await;
        fixture.applicant("ana@example.com", admin_id).await;
        let context = fixture.context().await;

        let profile = context.sign_in("ana@example.com", "secret1").await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Applicant);
        assert_eq!(profile.admin_id, Some(admin_id));
        assert_eq!(context.current_profile().await, Some(profile));

        context.sign_out().await;
        assert_eq!(context.current_profile().await, None);
    }

    #[tokio::test]
    async fn failed_sign_in_returns_provider_message() {
        let fixture = Fixture::new(MemoryStore::new());
        fixture.admin("agent@example.com").await;
        let context = fixture.context().await;
        let err = context.sign_in("agent@example.com", "wrong-password").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn listener_follows_session_changes() {
        let fixture = Fixture::new(MemoryStore::new());
        let admin_id = fixture.admin("agent@example.com").await;
        let context = fixture.context().await;
        let mut states = context.watch();

        // Sign in through the client, not the context: only the listener
        // can pick this up.
        fixture.auth.sign_in_with_password("agent@example.com", "secret1").await.unwrap();
        let state = states
            .wait_for(|s| matches!(s, ProfileState::Ready(Some(_))))
            .await
            .unwrap()
            .clone();
        match state {
            ProfileState::Ready(Some(profile)) => {
                assert_eq!(profile.id, admin_id);
                assert!(profile.is_admin());
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn current_profile_waits_for_pending_resolution() {
        let fixture = Fixture::new(MemoryStore::with_latency(Duration::from_millis(50)));
        let admin_id = fixture.admin("agent@example.com").await;
        let context = fixture.context().await;

        fixture.auth.sign_in_with_password("agent@example.com", "secret1").await.unwrap();
        tokio::task::yield_now().await;
        // The listener's lookup is still sleeping; the accessor must not
        // answer from the stale `Ready(None)`.
        let profile = context.current_profile().await;
        assert_eq!(profile.map(|p| p.id), Some(admin_id));
    }

    #[tokio::test]
    async fn lookup_failure_settles_to_none() {
        let fixture = Fixture::new(MemoryStore::new());
        fixture.admin("agent@example.com").await;
        fixture.store.fail_on(StoreOp::Select, ADMIN_TABLE, "timeout");
        let context = fixture.context().await;

        let profile = context.sign_in("agent@example.com", "secret1").await.unwrap();
        assert_eq!(profile, None);
        assert_eq!(state_of(&context), ProfileState::Ready(None));

        // Recovery: the accessor retries from the principal the client holds.
        fixture.store.clear_failure(StoreOp::Select, ADMIN_TABLE);
        assert!(context.current_profile().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_lookup_does_not_leave_waiters_hanging() {
        let fixture = Fixture::new(MemoryStore::with_latency(Duration::from_millis(100)));
        fixture.admin("agent@example.com").await;
        fixture.store.fail_on(StoreOp::Select, ADMIN_TABLE, "timeout");
        let context = fixture.context().await;
        assert_eq!(context.sign_in("agent@example.com", "secret1").await.unwrap(), None);
        // Let the listener's own lookup for the sign-in finish too.
        tokio::time::sleep(Duration::from_secs(1)).await;
        fixture.store.clear_failure(StoreOp::Select, ADMIN_TABLE);

        // Dropped while its re-resolution is still sleeping in the store.
        let abandoned = tokio::time::timeout(Duration::from_millis(10), context.current_profile()).await;
        assert!(abandoned.is_err());
        assert_eq!(state_of(&context), ProfileState::Ready(None));

        let profile = tokio::time::timeout(Duration::from_secs(5), context.current_profile())
            .await
            .expect("current_profile settles after a cancelled lookup");
        assert!(profile.map(|p| p.is_admin()).unwrap_or(false));
    }

    #[tokio::test]
    async fn applicant_sign_up_keeps_admin_session() {
        let fixture = Fixture::new(MemoryStore::new());
        let admin_id = fixture.admin("agent@example.com").await;
        let context = fixture.context().await;
        context.sign_in("agent@example.com", "secret1").await.unwrap();

        let applicant = context
            .sign_up_applicant("new@example.com", "secret1", Some("New Person"), admin_id)
            .await
            .unwrap();
        assert_eq!(applicant.admin_id, Some(admin_id));
        assert_eq!(context.auth().current_user().await.map(|u| u.id), Some(admin_id));
        assert_eq!(context.current_profile().await.map(|p| p.role), Some(Role::Admin));
    }
}
