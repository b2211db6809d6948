use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use url::Url;

use crate::identity::jwt::{api_key_role, DEFAULT_AUDIENCE};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },

    /// The portal only ever holds the public key.
    #[error("Invalid Supabase key: secret key detected. Use the anon/publishable key.")]
    SecretKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub supabase: SupabaseConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: Url,
    #[serde(skip_serializing)]
    pub anon_key: String,
    /// When set, access tokens are verified locally instead of asking the
    /// identity service on every request.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub jwt_audience: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable lookup. `from_env` passes
    /// the process environment.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let url = required(&lookup, "SUPABASE_URL")?;
        let url = Url::parse(&url).map_err(|_| ConfigError::Invalid { var: "SUPABASE_URL", value: url })?;
        let anon_key = required(&lookup, "SUPABASE_ANON_KEY")?;
        check_public_key(&anon_key)?;

        let supabase = SupabaseConfig {
            url,
            anon_key,
            jwt_secret: lookup("SUPABASE_JWT_SECRET").filter(|s| !s.is_empty()),
            jwt_audience: lookup("SUPABASE_JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
        };

        // Set defaults based on environment, then override with specific env vars
        let preset = match environment {
            Environment::Production => Self::production(supabase),
            Environment::Staging => Self::staging(supabase),
            Environment::Development => Self::development(supabase),
        };
        preset.with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.database.url = lookup("DATABASE_URL").filter(|s| !s.is_empty());
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", v)?;
        }
        if let Some(v) = lookup("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = parse("DATABASE_ENABLE_QUERY_LOGGING", v)?;
        }

        // PORTAL_PORT wins over the generic PORT
        if let Some(v) = lookup("PORT") {
            self.api.port = parse("PORT", v)?;
        }
        if let Some(v) = lookup("PORTAL_PORT") {
            self.api.port = parse("PORTAL_PORT", v)?;
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse("API_ENABLE_REQUEST_LOGGING", v)?;
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse("API_MAX_REQUEST_SIZE_BYTES", v)?;
        }

        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = parse("SECURITY_ENABLE_CORS", v)?;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(self)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn development(supabase: SupabaseConfig) -> Self {
        Self {
            environment: Environment::Development,
            supabase,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 4200,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:4200".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging(supabase: SupabaseConfig) -> Self {
        Self {
            environment: Environment::Staging,
            supabase,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production(supabase: SupabaseConfig) -> Self {
        Self {
            environment: Environment::Production,
            supabase,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { var, value })
}

/// Rejects both secret key formats: the prefixed one and a legacy JWT
/// carrying the service role.
pub fn check_public_key(key: &str) -> Result<(), ConfigError> {
    if key.starts_with("sb_secret_") || api_key_role(key).as_deref() == Some("service_role") {
        return Err(ConfigError::SecretKey);
    }
    Ok(())
}
