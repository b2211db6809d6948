pub mod admin;
pub mod applicant;

pub use admin::Admin;
pub use applicant::Applicant;

use serde::de::DeserializeOwned;

use super::{Row, StoreError};

pub const ADMIN_TABLE: &str = "admin";
pub const USERS_TABLE: &str = "users";

/// Decodes a storage row into a model, ignoring columns the model does not name.
pub fn from_row<T: DeserializeOwned>(table: &str, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| StoreError::InvalidPayload(format!("{}: {}", table, e)))
}
