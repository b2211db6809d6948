use std::sync::Arc;

use axum::extract::Extension;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult, RequestSession};
use crate::session::Profile;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub profile: Profile,
    pub email: Option<String>,
    pub home: &'static str,
}

/// GET /api/whoami - the caller's resolved profile
pub async fn whoami(
    Extension(profile): Extension<Profile>,
    Extension(session): Extension<Arc<RequestSession>>,
) -> ApiResult<WhoAmI> {
    let email = session.user().and_then(|u| u.email.clone());
    let home = profile.role.home_route();
    Ok(ApiResponse::success(WhoAmI { profile, email, home }))
}
