//! Fixtures over the in-memory backends, shared by unit and integration
//! tests. The helpers panic on failure.

use std::sync::Arc;

use uuid::Uuid;

use crate::data::{DataService, Workspace};
use crate::identity::MemoryIdentityProvider;
use crate::store::MemoryStore;

/// Password every fixture account is registered with.
pub const FIXTURE_PASSWORD: &str = "secret1";

/// JWT secret of the fixture identity provider.
pub const FIXTURE_JWT_SECRET: &str = "fixture-jwt-secret";

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentityProvider>,
    pub data: Arc<DataService>,
    pub workspace: Workspace,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let identity = Arc::new(MemoryIdentityProvider::new(FIXTURE_JWT_SECRET));
        let data = Arc::new(DataService::new(store.clone(), identity.clone()));
        let workspace = Workspace::new(data.clone());
        Self { store, identity, data, workspace }
    }

    /// Registers an admin through the normal sign-up path.
    pub async fn admin(&self, email: &str) -> Uuid {
        match self.data.register_admin(email, FIXTURE_PASSWORD, "Agent").await {
            Ok(profile) => profile.id,
            Err(e) => panic!("fixture admin {}: {}", email, e),
        }
    }

    pub async fn applicant(&self, admin_id: Uuid, email: &str, full_name: &str) -> Uuid {
        match self.data.create_user(email, FIXTURE_PASSWORD, admin_id, Some(full_name)).await {
            Ok(applicant) => applicant.id,
            Err(e) => panic!("fixture applicant {}: {}", email, e),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
