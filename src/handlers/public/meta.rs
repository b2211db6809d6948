use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schema::{self, Section, Tab};

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Visa Portal API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant visa application portal",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/login, /auth/register (public)",
                "schema": "/api/schema (public)",
                "whoami": "/api/whoami (any profile)",
                "application": "/api/app[/sections/:key] (applicants)",
                "admin": "/api/admin/users[/:id[/sections/:key]] (admins)",
            }
        }
    }))
}

/// GET /health - storage reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.data.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": { "status": "degraded", "timestamp": now, "database_error": e.to_string() }
            })),
        ),
    }
}

#[derive(Serialize)]
pub struct SchemaDocument {
    pub sections: &'static [&'static Section],
    pub tabs: &'static [Tab],
}

/// GET /api/schema - every section and the tabs that arrange them
pub async fn schema() -> ApiResult<SchemaDocument> {
    Ok(ApiResponse::success(SchemaDocument { sections: schema::sections(), tabs: schema::tabs() }))
}
