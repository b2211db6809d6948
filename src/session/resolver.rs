use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::Profile;
use crate::store::models::{self, Admin, Applicant, ADMIN_TABLE, USERS_TABLE};
use crate::store::{Query, Store, StoreError};

/// Maps a principal id to its profile by probing both identity tables.
#[derive(Clone)]
pub struct ProfileResolver {
    store: Arc<dyn Store>,
}

impl ProfileResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    /// Both lookups run concurrently. Presence in `admin` wins; neither
    /// table knowing the id is `None`.
    pub async fn resolve_profile(&self, principal_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let id = principal_id.to_string();
        let admin_query = Query::table(ADMIN_TABLE).columns(&["id", "full_name"]).eq("id", id.clone());
        let user_query = Query::table(USERS_TABLE).columns(&["id", "full_name", "email", "admin_id"]).eq("id", id);

        let (admin_row, user_row) = tokio::try_join!(
            self.store.select_maybe_one(admin_query),
            self.store.select_maybe_one(user_query),
        )?;

        if let Some(row) = admin_row {
            debug!(%principal_id, "resolved admin profile");
            return Ok(Some(models::from_row::<Admin>(ADMIN_TABLE, row)?.into()));
        }
        if let Some(row) = user_row {
            debug!(%principal_id, "resolved applicant profile");
            return Ok(Some(models::from_row::<Applicant>(USERS_TABLE, row)?.into()));
        }
        debug!(%principal_id, "principal has no portal profile");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use crate::store::{MemoryStore, StoreOp};
    use serde_json::json;
    use std::time::Duration;

    fn row(value: serde_json::Value) -> crate::store::Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn admin_and_applicant_resolve_to_their_roles() {
        let store = Arc::new(MemoryStore::new());
        let admin_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        store.insert_many(ADMIN_TABLE, vec![row(json!({"id": admin_id, "full_name": "Agent"}))]).await.unwrap();
        store
            .insert_many(USERS_TABLE, vec![row(json!({"id": user_id, "full_name": "Ana", "admin_id": admin_id}))])
            .await
            .unwrap();
        let resolver = ProfileResolver::new(store);

        let admin = resolver.resolve_profile(admin_id).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.admin_id, None);

        let applicant = resolver.resolve_profile(user_id).await.unwrap().unwrap();
        assert_eq!(applicant.role, Role::Applicant);
        assert_eq!(applicant.admin_id, Some(admin_id));

        assert_eq!(resolver.resolve_profile(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn probes_run_concurrently() {
        let store = Arc::new(MemoryStore::with_latency(Duration::from_millis(100)));
        let resolver = ProfileResolver::new(store.clone());

        let started = tokio::time::Instant::now();
        resolver.resolve_profile(Uuid::new_v4()).await.unwrap();
        assert_eq!(store.select_calls(), 2);
        assert!(started.elapsed() < Duration::from_millis(150), "probes ran sequentially: {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn lookup_failure_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.fail_on(StoreOp::Select, USERS_TABLE, "connection reset");
        let resolver = ProfileResolver::new(store);
        let err = resolver.resolve_profile(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }
}
