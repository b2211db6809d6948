use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Row, StoreError};

/// End user filling in the application, stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// `None` marks an orphan that no admin scope will ever match.
    #[serde(default)]
    pub admin_id: Option<Uuid>,
}

impl Applicant {
    pub fn to_row(&self) -> Result<Row, StoreError> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(row)) => Ok(row),
            Ok(_) => Err(StoreError::InvalidPayload("applicant did not serialize to an object".to_string())),
            Err(e) => Err(StoreError::InvalidPayload(e.to_string())),
        }
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [self.full_name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&needle))
    }
}
