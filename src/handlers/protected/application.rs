use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::api::AppState;
use crate::data::{Application, ApplicationInput, SaveReport, SectionData, SectionInput};
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::Profile;

/// GET /api/app - the caller's whole application
pub async fn application_get(
    State(state): State<AppState>,
    Extension(profile): Extension<Profile>,
) -> ApiResult<Application> {
    let application = state.workspace.load_application(profile.id).await?;
    Ok(ApiResponse::success(application))
}

/// PUT /api/app - save every section present in the body
pub async fn application_put(
    State(state): State<AppState>,
    Extension(profile): Extension<Profile>,
    Json(input): Json<ApplicationInput>,
) -> ApiResult<SaveReport> {
    let report = state.workspace.save_all(profile.id, input).await?;
    Ok(ApiResponse::success(report))
}

/// GET /api/app/sections/:key
pub async fn section_get(
    State(state): State<AppState>,
    Extension(profile): Extension<Profile>,
    Path(key): Path<String>,
) -> ApiResult<SectionData> {
    let data = state.workspace.load_section(profile.id, &key).await?;
    Ok(ApiResponse::success(data))
}

/// PUT /api/app/sections/:key
pub async fn section_put(
    State(state): State<AppState>,
    Extension(profile): Extension<Profile>,
    Path(key): Path<String>,
    Json(input): Json<SectionInput>,
) -> ApiResult<SectionData> {
    state.workspace.save_section(profile.id, &key, input).await?;
    let data = state.workspace.load_section(profile.id, &key).await?;
    Ok(ApiResponse::success(data))
}
