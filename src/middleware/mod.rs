pub mod auth;
pub mod guard;
pub mod response;

pub use auth::{session_middleware, RequestSession, TokenVerifier};
pub use guard::{require_admin, require_applicant, require_profile};
pub use response::{ApiResponse, ApiResult};
