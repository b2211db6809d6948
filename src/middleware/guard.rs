use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::RequestSession;
use crate::error::ApiError;
use crate::guards::{Guard, GuardOutcome};

/// Any signed-in caller with a portal profile.
pub async fn require_profile(request: Request, next: Next) -> Response {
    enforce(Guard::Authenticated, request, next).await
}

pub async fn require_admin(request: Request, next: Next) -> Response {
    enforce(Guard::AdminOnly, request, next).await
}

pub async fn require_applicant(request: Request, next: Next) -> Response {
    enforce(Guard::ApplicantOnly, request, next).await
}

/// Runs the guard against the request's session. On success the resolved
/// [`Profile`](crate::session::Profile) is available as an extension.
async fn enforce(guard: Guard, mut request: Request, next: Next) -> Response {
    let Some(session) = request.extensions().get::<Arc<RequestSession>>().cloned() else {
        return ApiError::internal_server_error("Session middleware not installed").into_response();
    };

    match guard.check(session.as_ref()).await {
        GuardOutcome::Allow(profile) => {
            request.extensions_mut().insert(profile);
            next.run(request).await
        }
        GuardOutcome::RedirectToLogin => {
            let message = match session.user() {
                None => "Authentication required",
                Some(_) => "No portal profile for this account",
            };
            ApiError::unauthorized(message).into_response()
        }
        GuardOutcome::RedirectToHome(role) => ApiError::forbidden(format!(
            "This area is not available to {} accounts; continue at {}",
            role,
            role.home_route()
        ))
        .into_response(),
    }
}
