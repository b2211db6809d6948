//! Schema-driven reads and writes of applicant data, plus tenant-scoped
//! management of the applicants themselves.

pub mod workspace;

pub use workspace::{print_layout, Application, ApplicationInput, PrintLayout, SaveReport, SectionInput, Workspace, WorkspaceError};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::filter::SortDirection;
use crate::identity::IdentityProvider;
use crate::schema::{registry, Section, SectionRecord};
use crate::session::accounts::{self, AccountError};
use crate::store::models::{self, Applicant, USERS_TABLE};
use crate::store::{PurgeError, Query, Row, Store, StoreError, OWNER_COLUMN};

#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("User not found or not in your scope.")]
    OutOfScope,

    #[error(transparent)]
    Purge(#[from] PurgeError),

    #[error(transparent)]
    Account(#[from] AccountError),
}

/// Loaded rows of one section.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SectionData {
    Single(Option<SectionRecord>),
    Many(Vec<SectionRecord>),
}

impl SectionData {
    pub fn records(&self) -> Vec<&SectionRecord> {
        match self {
            SectionData::Single(record) => record.iter().collect(),
            SectionData::Many(records) => records.iter().collect(),
        }
    }
}

/// Section data keyed by table name.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct UserData {
    tables: HashMap<&'static str, SectionData>,
}

impl UserData {
    pub fn get(&self, table: &str) -> Option<&SectionData> {
        self.tables.get(table)
    }

    pub fn single(&self, table: &str) -> Option<&SectionRecord> {
        match self.tables.get(table) {
            Some(SectionData::Single(record)) => record.as_ref(),
            _ => None,
        }
    }

    pub fn rows(&self, table: &str) -> &[SectionRecord] {
        match self.tables.get(table) {
            Some(SectionData::Many(records)) => records,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn stamp(mut row: Row, user_id: Uuid) -> Row {
    row.insert(OWNER_COLUMN.to_string(), Value::String(user_id.to_string()));
    row.insert("updated_at".to_string(), now());
    row
}

pub struct DataService {
    store: Arc<dyn Store>,
    identity: Arc<dyn IdentityProvider>,
}

impl DataService {
    pub fn new(store: Arc<dyn Store>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// One concurrent read per section. Any failure fails the whole load.
    pub async fn load_user_data(&self, user_id: Uuid, sections: &[&'static Section]) -> Result<UserData, DataError> {
        let reads = sections.iter().map(|section| self.load_section(user_id, *section));
        let loaded = try_join_all(reads).await?;
        Ok(UserData { tables: loaded.into_iter().collect() })
    }

    async fn load_section(&self, user_id: Uuid, section: &'static Section) -> Result<(&'static str, SectionData), DataError> {
        let query = Query::table(section.table).eq(OWNER_COLUMN, user_id.to_string());
        let data = if section.repeatable {
            let rows = self
                .store
                .select(query.order_by("updated_at", SortDirection::Asc))
                .await?;
            SectionData::Many(rows.iter().map(|row| SectionRecord::from_row(section, row)).collect())
        } else {
            let row = self.store.select_maybe_one(query).await?;
            SectionData::Single(row.map(|row| SectionRecord::from_row(section, &row)))
        };
        Ok((section.table, data))
    }

    /// Writes the applicant's single row of `table`, keyed on `user_id`.
    pub async fn upsert_single(&self, table: &str, user_id: Uuid, payload: Row) -> Result<(), DataError> {
        self.store.upsert(table, stamp(payload, user_id), OWNER_COLUMN).await?;
        Ok(())
    }

    /// Deletes every row of `user_id` in `table`, then inserts `rows`. An
    /// empty `rows` only clears.
    pub async fn replace_many(&self, table: &str, user_id: Uuid, rows: Vec<Row>) -> Result<(), DataError> {
        let stamped = rows.into_iter().map(|row| stamp(row, user_id)).collect();
        self.store
            .replace_owned(table, OWNER_COLUMN, Value::String(user_id.to_string()), stamped)
            .await?;
        Ok(())
    }

    pub async fn list_tenant_users(&self, admin_id: Uuid) -> Result<Vec<Applicant>, DataError> {
        let rows = self
            .store
            .select(
                Query::table(USERS_TABLE)
                    .columns(&["id", "full_name", "email", "admin_id"])
                    .eq("admin_id", admin_id.to_string())
                    .order_by("full_name", SortDirection::Asc),
            )
            .await?;
        rows.into_iter()
            .map(|row| models::from_row(USERS_TABLE, row).map_err(DataError::from))
            .collect()
    }

    /// `None` when the applicant does not exist or belongs to another admin.
    pub async fn get_tenant_user(&self, admin_id: Uuid, user_id: Uuid) -> Result<Option<Applicant>, DataError> {
        let row = self
            .store
            .select_maybe_one(
                Query::table(USERS_TABLE)
                    .columns(&["id", "full_name", "email", "admin_id"])
                    .eq("id", user_id.to_string())
                    .eq("admin_id", admin_id.to_string()),
            )
            .await?;
        row.map(|row| models::from_row(USERS_TABLE, row))
            .transpose()
            .map_err(DataError::from)
    }

    /// Removes the applicant and every section row they own. The scope check
    /// happens before anything is deleted.
    pub async fn delete_user(&self, admin_id: Uuid, user_id: Uuid) -> Result<(), DataError> {
        if self.get_tenant_user(admin_id, user_id).await?.is_none() {
            return Err(DataError::OutOfScope);
        }
        let tables = registry::section_tables();
        let result = self
            .store
            .purge_owner(&tables, OWNER_COLUMN, Value::String(user_id.to_string()), USERS_TABLE, "id")
            .await;
        match result {
            Ok(()) => {
                info!(%admin_id, %user_id, "deleted applicant");
                Ok(())
            }
            Err(e) => {
                warn!(%admin_id, %user_id, error = %e, "applicant delete stopped");
                Err(e.into())
            }
        }
    }

    /// Issues credentials for a new applicant without touching any caller
    /// session, then records them under `admin_id`.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        admin_id: Uuid,
        full_name: Option<&str>,
    ) -> Result<Applicant, DataError> {
        Ok(accounts::register_applicant(self.identity.as_ref(), self.store.as_ref(), email, password, full_name, admin_id).await?)
    }

    pub async fn register_admin(&self, email: &str, password: &str, full_name: &str) -> Result<crate::session::Profile, DataError> {
        Ok(accounts::register_admin(self.identity.as_ref(), self.store.as_ref(), email, password, full_name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::find_section;
    use crate::store::StoreOp;
    use crate::testing::TestContext;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn replace_many_twice_keeps_only_second_batch() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        let first = vec![row(json!({"country": "NZ"})), row(json!({"country": "FJ"}))];
        let second = vec![row(json!({"country": "JP"}))];
        ctx.data.replace_many("travel_history", user, first).await.unwrap();
        ctx.data.replace_many("travel_history", user, second).await.unwrap();

        let stored = ctx.store.rows("travel_history");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["country"], json!("JP"));
        assert_eq!(stored[0]["user_id"], json!(user.to_string()));
        assert!(stored[0].contains_key("updated_at"));
    }

    #[tokio::test]
    async fn replace_many_empty_clears() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        ctx.data.replace_many("coe_history", user, vec![row(json!({"coe_code": "X"}))]).await.unwrap();
        ctx.data.replace_many("coe_history", user, vec![]).await.unwrap();
        assert!(ctx.store.rows("coe_history").is_empty());
    }

    #[tokio::test]
    async fn failed_delete_skips_insert() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        ctx.data.replace_many("travel_history", user, vec![row(json!({"country": "NZ"}))]).await.unwrap();
        ctx.store.fail_on(StoreOp::Delete, "travel_history", "permission denied");

        let err = ctx.data.replace_many("travel_history", user, vec![row(json!({"country": "JP"}))]).await.unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
        let stored = ctx.store.rows("travel_history");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["country"], json!("NZ"));
    }

    #[tokio::test]
    async fn failed_insert_after_delete_leaves_section_empty() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        ctx.data.replace_many("travel_history", user, vec![row(json!({"country": "NZ"}))]).await.unwrap();
        ctx.store.fail_on(StoreOp::Insert, "travel_history", "value too long");

        assert!(ctx.data.replace_many("travel_history", user, vec![row(json!({"country": "JP"}))]).await.is_err());
        assert!(ctx.store.rows("travel_history").is_empty());
    }

    #[tokio::test]
    async fn second_upsert_overwrites_the_single_row() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        let first = row(json!({"given_name": "Jane", "family_name": "Smith", "date_of_birth": null}));
        let second = row(json!({"given_name": "Jane", "family_name": "Doe", "date_of_birth": "1990-04-02"}));
        ctx.data.upsert_single("visa_applications", user, first).await.unwrap();
        ctx.data.upsert_single("visa_applications", user, second).await.unwrap();

        let stored = ctx.store.rows("visa_applications");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["family_name"], json!("Doe"));

        let sections = [find_section("visaApplications").unwrap()];
        let data = ctx.data.load_user_data(user, &sections).await.unwrap();
        let record = data.single("visa_applications").expect("saved row loads back");
        assert_eq!(record.display("family_name"), "Doe");
        assert_eq!(record.display("date_of_birth"), "1990-04-02");
        assert!(record.updated_at().map(|t| !t.is_empty()).unwrap_or(false));
    }

    #[tokio::test]
    async fn load_orders_rows_and_absent_single_is_none() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        ctx.store
            .insert_many(
                "family_members",
                vec![
                    row(json!({"user_id": user.to_string(), "full_name": "Later", "updated_at": "2024-02-01T00:00:00Z"})),
                    row(json!({"user_id": user.to_string(), "full_name": "Earlier", "updated_at": "2024-01-01T00:00:00Z"})),
                    row(json!({"user_id": Uuid::new_v4().to_string(), "full_name": "Someone else"})),
                ],
            )
            .await
            .unwrap();

        let sections = [find_section("familyMembers").unwrap(), find_section("studentDetails").unwrap()];
        let data = ctx.data.load_user_data(user, &sections).await.unwrap();
        let names: Vec<String> = data.rows("family_members").iter().map(|r| r.display("full_name")).collect();
        assert_eq!(names, vec!["Earlier", "Later"]);
        assert!(matches!(data.get("student_details"), Some(SectionData::Single(None))));
    }

    #[tokio::test]
    async fn one_failing_read_fails_the_load() {
        let ctx = TestContext::new();
        ctx.store.fail_on(StoreOp::Select, "health_insurance", "relation does not exist");
        let err = ctx.data.load_user_data(Uuid::new_v4(), registry::sections()).await.unwrap_err();
        assert_eq!(err.to_string(), "relation does not exist");
    }

    #[tokio::test]
    async fn duplicate_single_rows_fail_the_load() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        let dup = row(json!({"user_id": user.to_string(), "course_name": "A"}));
        ctx.store.insert_many("student_details", vec![dup.clone(), dup]).await.unwrap();
        let sections = [find_section("studentDetails").unwrap()];
        assert!(ctx.data.load_user_data(user, &sections).await.is_err());
    }

    #[tokio::test]
    async fn tenant_listing_is_scoped_and_sorted() {
        let ctx = TestContext::new();
        let admin_a = ctx.admin("a@example.com").await;
        let admin_b = ctx.admin("b@example.com").await;
        ctx.applicant(admin_a, "zoe@example.com", "Zoe").await;
        ctx.applicant(admin_a, "al@example.com", "Al").await;
        let other = ctx.applicant(admin_b, "bo@example.com", "Bo").await;

        let names: Vec<_> = ctx
            .data
            .list_tenant_users(admin_a)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.full_name.unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["Al", "Zoe"]);
        assert!(ctx.data.get_tenant_user(admin_a, other).await.unwrap().is_none());
        assert!(ctx.data.get_tenant_user(admin_b, other).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_outside_scope_changes_nothing() {
        let ctx = TestContext::new();
        let admin_a = ctx.admin("a@example.com").await;
        let admin_b = ctx.admin("b@example.com").await;
        let user = ctx.applicant(admin_b, "bo@example.com", "Bo").await;
        ctx.data.replace_many("travel_history", user, vec![row(json!({"country": "NZ"}))]).await.unwrap();

        let err = ctx.data.delete_user(admin_a, user).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found or not in your scope.");
        assert_eq!(ctx.store.rows("travel_history").len(), 1);
        assert_eq!(ctx.store.rows(USERS_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn delete_stops_at_failing_table() {
        let ctx = TestContext::new();
        let admin = ctx.admin("a@example.com").await;
        let user = ctx.applicant(admin, "bo@example.com", "Bo").await;
        ctx.data.replace_many("travel_history", user, vec![row(json!({"country": "NZ"}))]).await.unwrap();
        ctx.data.replace_many("skill_assessment", user, vec![row(json!({"anzsco_code": "261313"}))]).await.unwrap();
        ctx.store.fail_on(StoreOp::Delete, "employment_history", "permission denied");

        let err = ctx.data.delete_user(admin, user).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete from employment_history: permission denied");
        // Earlier tables were cleared, later ones and the identity row remain.
        assert!(ctx.store.rows("travel_history").is_empty());
        assert_eq!(ctx.store.rows("skill_assessment").len(), 1);
        assert_eq!(ctx.store.rows(USERS_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn create_list_delete() {
        let ctx = TestContext::new();
        let admin = ctx.admin("agent@example.com").await;
        let created = ctx.data.create_user("new.person@example.com", "secret1", admin, None).await.unwrap();
        assert_eq!(created.full_name.as_deref(), Some("new.person"));

        let listed = ctx.data.list_tenant_users(admin).await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        ctx.data.delete_user(admin, created.id).await.unwrap();
        assert!(ctx.data.list_tenant_users(admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_credential_issuance_writes_nothing() {
        let ctx = TestContext::new();
        let admin = ctx.admin("agent@example.com").await;
        ctx.data.create_user("dup@example.com", "secret1", admin, None).await.unwrap();
        let err = ctx.data.create_user("dup@example.com", "secret1", admin, None).await.unwrap_err();
        assert_eq!(err.to_string(), "User already registered");
        assert_eq!(ctx.store.rows(USERS_TABLE).len(), 1);
    }
}
