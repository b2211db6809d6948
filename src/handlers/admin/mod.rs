// handlers/admin/mod.rs - tenant management, admin profiles only
//
// Every route that names an applicant checks that the applicant belongs to
// the calling admin before reading or writing anything.
pub mod sections;
pub mod users;

pub use sections::{section_get, section_put};
pub use users::{user_delete, user_get, user_put, users_create, users_list};

use uuid::Uuid;

use crate::api::AppState;
use crate::data::DataError;
use crate::error::ApiError;
use crate::store::models::Applicant;

pub(crate) async fn scoped_applicant(state: &AppState, admin_id: Uuid, user_id: Uuid) -> Result<Applicant, ApiError> {
    state
        .data
        .get_tenant_user(admin_id, user_id)
        .await?
        .ok_or_else(|| DataError::OutOfScope.into())
}
