use axum::{
    extract::{Extension, Path, State},
    Json,
};
use uuid::Uuid;

use super::scoped_applicant;
use crate::api::AppState;
use crate::data::{SectionData, SectionInput};
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::Profile;

/// GET /api/admin/users/:id/sections/:key
pub async fn section_get(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Path((user_id, key)): Path<(Uuid, String)>,
) -> ApiResult<SectionData> {
    let user = scoped_applicant(&state, admin.id, user_id).await?;
    let data = state.workspace.load_section(user.id, &key).await?;
    Ok(ApiResponse::success(data))
}

/// PUT /api/admin/users/:id/sections/:key
pub async fn section_put(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Path((user_id, key)): Path<(Uuid, String)>,
    Json(input): Json<SectionInput>,
) -> ApiResult<SectionData> {
    let user = scoped_applicant(&state, admin.id, user_id).await?;
    state.workspace.save_section(user.id, &key, input).await?;
    let data = state.workspace.load_section(user.id, &key).await?;
    Ok(ApiResponse::success(data))
}
