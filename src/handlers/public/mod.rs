// handlers/public/mod.rs - endpoints reachable without a session
//
// Token acquisition, admin sign-up, the form schema and service status.
pub mod auth;
pub mod meta;

pub use auth::{login, register};
pub use meta::{health, root, schema};
