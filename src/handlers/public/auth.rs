use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::AppState;
use crate::error::ApiError;
use crate::guards::APPLICANT_HOME;
use crate::identity::AuthError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::Profile;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub profile: Option<Profile>,
    /// Where the caller lands: `/admin` for admins, `/app` otherwise.
    pub home: &'static str,
}

/// POST /auth/login - exchange email and password for an access token
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let session = state
        .identity
        .sign_in_with_password(email, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::Rejected(msg) => ApiError::unauthorized(msg),
            other => other.into(),
        })?;

    // Same rule as every other lookup: a failure reads as "no profile".
    let profile = match state.resolver.resolve_profile(session.user.id).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(user_id = %session.user.id, error = %e, "profile lookup failed");
            None
        }
    };
    let home = profile.as_ref().map(|p| p.role.home_route()).unwrap_or(APPLICANT_HOME);
    info!(user_id = %session.user.id, home, "login");

    Ok(ApiResponse::success(LoginResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        expires_in: session.expires_in,
        profile,
        home,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

/// POST /auth/register - admin self sign-up
pub async fn register(State(state): State<AppState>, Json(body): Json<RegisterRequest>) -> ApiResult<Profile> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    let profile = state.data.register_admin(email, &body.password, &body.full_name).await?;
    Ok(ApiResponse::created(profile))
}
