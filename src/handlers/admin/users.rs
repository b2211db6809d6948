use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scoped_applicant;
use crate::api::AppState;
use crate::data::{print_layout, Application, ApplicationInput, PrintLayout, SaveReport};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::Profile;
use crate::store::models::Applicant;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive match on name or email
    pub search: Option<String>,
}

/// GET /api/admin/users - the caller's applicants, by name
pub async fn users_list(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Applicant>> {
    let mut users = state.data.list_tenant_users(admin.id).await?;
    if let Some(needle) = query.search.as_deref() {
        users.retain(|u| u.matches_search(needle));
    }
    Ok(ApiResponse::success(users))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// POST /api/admin/users - create an applicant under the caller
pub async fn users_create(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<Applicant> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    let created = state
        .data
        .create_user(email, &body.password, admin.id, body.full_name.as_deref())
        .await?;
    Ok(ApiResponse::created(created))
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    #[serde(default)]
    pub print: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserDetail {
    Editable { user: Applicant, application: Application },
    Print { user: Applicant, print: PrintLayout },
}

/// GET /api/admin/users/:id[?print=true]
pub async fn user_get(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<DetailQuery>,
) -> ApiResult<UserDetail> {
    let user = scoped_applicant(&state, admin.id, user_id).await?;
    let application = state.workspace.load_application(user.id).await?;
    let detail = if query.print {
        let print = print_layout(&application, user.full_name.as_deref());
        UserDetail::Print { user, print }
    } else {
        UserDetail::Editable { user, application }
    };
    Ok(ApiResponse::success(detail))
}

/// PUT /api/admin/users/:id - save the applicant's sections present in the body
pub async fn user_put(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<ApplicationInput>,
) -> ApiResult<SaveReport> {
    let user = scoped_applicant(&state, admin.id, user_id).await?;
    let report = state.workspace.save_all(user.id, input).await?;
    Ok(ApiResponse::success(report))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Uuid,
    pub deleted: bool,
}

/// DELETE /api/admin/users/:id - the applicant and every row they own
pub async fn user_delete(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Deleted> {
    state.data.delete_user(admin.id, user_id).await?;
    Ok(ApiResponse::success(Deleted { id: user_id, deleted: true }))
}
