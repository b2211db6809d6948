//! Router assembly and the state every handler shares.
//!
//! Three tiers, mirroring the guards: public (`/`, `/health`, `/auth/*`,
//! `/api/schema`), any signed-in profile (`/api/whoami`), and the two role
//! areas `/api/app/*` (applicants) and `/api/admin/*` (admins).

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::data::{DataService, Workspace};
use crate::handlers::{admin, protected, public};
use crate::identity::{GoTrueProvider, IdentityProvider, JwtKeys, MemoryIdentityProvider};
use crate::middleware::{require_admin, require_applicant, require_profile, session_middleware, TokenVerifier};
use crate::session::ProfileResolver;
use crate::store::{MemoryStore, PgStore, Store};

/// The two backends plus the way access tokens are checked.
pub struct Backends {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
    pub verifier: TokenVerifier,
}

impl Backends {
    /// Postgres for storage and the hosted auth service for identity.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let store = PgStore::connect(&config.database)
            .await
            .context("connecting to the database")?;
        let identity: Arc<dyn IdentityProvider> = Arc::new(
            GoTrueProvider::new(&config.supabase.url, config.supabase.anon_key.clone())
                .context("configuring the identity provider")?,
        );

        let verifier = match &config.supabase.jwt_secret {
            Some(secret) => TokenVerifier::Local(JwtKeys::from_secret(secret, config.supabase.jwt_audience.clone())),
            None => {
                warn!("SUPABASE_JWT_SECRET not set; access tokens are checked with the identity provider");
                TokenVerifier::Provider(identity.clone())
            }
        };
        Ok(Self { store: Arc::new(store), identity, verifier })
    }

    /// In-process backends; tokens are verified with the provider's own keys.
    pub fn memory(store: Arc<MemoryStore>, identity: Arc<MemoryIdentityProvider>) -> Self {
        let verifier = TokenVerifier::Local(identity.keys().clone());
        Self { store, identity, verifier }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub verifier: TokenVerifier,
    pub resolver: ProfileResolver,
    pub data: Arc<DataService>,
    pub workspace: Arc<Workspace>,
}

impl AppState {
    pub fn new(backends: Backends) -> Self {
        let data = Arc::new(DataService::new(backends.store.clone(), backends.identity.clone()));
        Self {
            identity: backends.identity,
            verifier: backends.verifier,
            resolver: ProfileResolver::new(backends.store),
            workspace: Arc::new(Workspace::new(data.clone())),
            data,
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(public_routes())
        // Session-aware API
        .merge(
            Router::new()
                .merge(whoami_routes())
                .merge(applicant_routes())
                .merge(admin_routes())
                .layer(from_fn_with_state(state.clone(), session_middleware)),
        )
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors(config));

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use axum::routing::post;

    Router::new()
        .route("/auth/login", post(public::login))
        .route("/auth/register", post(public::register))
        .route("/api/schema", get(public::schema))
}

fn whoami_routes() -> Router<AppState> {
    Router::new()
        .route("/api/whoami", get(protected::whoami))
        .route_layer(from_fn(require_profile))
}

fn applicant_routes() -> Router<AppState> {
    Router::new()
        .route("/api/app", get(protected::application_get).put(protected::application_put))
        .route(
            "/api/app/sections/:key",
            get(protected::section_get).put(protected::section_put),
        )
        .route_layer(from_fn(require_applicant))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(admin::users_list).post(admin::users_create))
        .route(
            "/api/admin/users/:id",
            get(admin::user_get).put(admin::user_put).delete(admin::user_delete),
        )
        .route(
            "/api/admin/users/:id/sections/:key",
            get(admin::section_get).put(admin::section_put),
        )
        .route_layer(from_fn(require_admin))
}

fn cors(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    info!(origins = origins.len(), "CORS enabled");
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::testing::TestContext;

    fn router(ctx: &TestContext, extra: &[(&str, &str)]) -> Router {
        let mut vars = vec![("SUPABASE_URL", "http://127.0.0.1:54321"), ("SUPABASE_ANON_KEY", "sb_publishable_test")];
        vars.extend_from_slice(extra);
        let config = AppConfig::from_source(|name| {
            vars.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string())
        })
        .unwrap();
        app(AppState::new(Backends::memory(ctx.store.clone(), ctx.identity.clone())), &config)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn protected_routes_need_a_session() {
        let ctx = TestContext::new();
        let response = router(&ctx, &[])
            .oneshot(Request::get("/api/app").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Authentication required");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn oversized_bodies_are_refused() {
        let ctx = TestContext::new();
        let payload = format!(r#"{{"email":"{}","password":"x"}}"#, "a".repeat(256));
        let response = router(&ctx, &[("API_MAX_REQUEST_SIZE_BYTES", "64")])
            .oneshot(
                Request::post("/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let ctx = TestContext::new();
        let response = router(&ctx, &[("SECURITY_CORS_ORIGINS", "https://portal.example")])
            .oneshot(
                Request::options("/api/schema")
                    .header("origin", "https://portal.example")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
            Some("https://portal.example")
        );
    }
}
