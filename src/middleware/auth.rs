use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::OnceCell;
use tracing::warn;

use crate::api::AppState;
use crate::error::ApiError;
use crate::guards::ProfileSource;
use crate::identity::{AuthError, AuthUser, IdentityProvider, JwtKeys};
use crate::session::{Profile, ProfileResolver};

/// How bearer tokens are checked.
#[derive(Clone)]
pub enum TokenVerifier {
    /// HS256 with the project's JWT secret, no network round trip.
    Local(JwtKeys),
    /// Ask the identity provider who the token belongs to.
    Provider(Arc<dyn IdentityProvider>),
}

impl TokenVerifier {
    pub async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        match self {
            TokenVerifier::Local(keys) => keys.verify(token).map(|claims| claims.user()),
            TokenVerifier::Provider(provider) => provider.get_user(token).await,
        }
    }
}

/// The caller of one request. The profile is resolved on first use and
/// then reused for the rest of the request.
pub struct RequestSession {
    user: Option<AuthUser>,
    resolver: ProfileResolver,
    profile: OnceCell<Option<Profile>>,
}

impl RequestSession {
    pub fn new(user: Option<AuthUser>, resolver: ProfileResolver) -> Self {
        Self { user, resolver, profile: OnceCell::new() }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }
}

#[async_trait]
impl ProfileSource for RequestSession {
    async fn current_profile(&self) -> Option<Profile> {
        self.profile
            .get_or_init(|| async {
                let user = self.user.as_ref()?;
                match self.resolver.resolve_profile(user.id).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!(principal = %user.id, error = %e, "profile lookup failed");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}

/// Attaches a [`RequestSession`] to every request. A missing token yields an
/// anonymous session; a bad one is rejected here.
pub async fn session_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match extract_bearer(&headers) {
        Ok(None) => None,
        Ok(Some(token)) => match state.verifier.verify(token).await {
            Ok(user) => Some(user),
            Err(e) => return ApiError::unauthorized(e.to_string()).into_response(),
        },
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    };

    let session = Arc::new(RequestSession::new(user, state.resolver.clone()));
    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| "Invalid Authorization header format")?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        Some(_) => Err("Empty bearer token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
