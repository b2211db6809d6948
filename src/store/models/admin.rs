use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant owner. The id is the identity provider's principal id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
}
