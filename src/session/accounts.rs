//! Account creation: credential issuance followed by the identity-table row.

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::Profile;
use crate::identity::{AuthError, IdentityProvider};
use crate::store::models::{Admin, Applicant, ADMIN_TABLE, USERS_TABLE};
use crate::store::{Row, Store, StoreError};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Trimmed full name, else the email's local part, else "New User".
pub fn display_name(email: &str, full_name: Option<&str>) -> String {
    full_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| email.split('@').next().map(str::trim).filter(|local| !local.is_empty()))
        .unwrap_or("New User")
        .to_string()
}

/// Self-service admin sign-up.
pub async fn register_admin(
    provider: &dyn IdentityProvider,
    store: &dyn Store,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<Profile, AccountError> {
    let user = provider.sign_up(email, password).await?;
    let admin = Admin { id: user.id, full_name: Some(display_name(email, Some(full_name))) };
    let mut row = Row::new();
    row.insert("id".into(), admin.id.to_string().into());
    row.insert("full_name".into(), admin.full_name.clone().into());
    store.insert_many(ADMIN_TABLE, vec![row]).await?;
    info!(admin_id = %admin.id, "registered admin");
    Ok(admin.into())
}

/// Creates an applicant owned by `admin_id`. The provider is used directly,
/// so no interactive session changes hands.
pub async fn register_applicant(
    provider: &dyn IdentityProvider,
    store: &dyn Store,
    email: &str,
    password: &str,
    full_name: Option<&str>,
    admin_id: Uuid,
) -> Result<Applicant, AccountError> {
    let user = provider.sign_up(email, password).await?;
    let applicant = Applicant {
        id: user.id,
        full_name: Some(display_name(email, full_name)),
        email: Some(email.to_string()),
        admin_id: Some(admin_id),
    };
    store.insert_many(USERS_TABLE, vec![applicant.to_row()?]).await?;
    info!(user_id = %applicant.id, %admin_id, "registered applicant");
    Ok(applicant)
}
