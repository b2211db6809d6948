// handlers/protected/mod.rs - endpoints behind a resolved profile
//
// `whoami` accepts either role; the application routes are applicant-only and
// always act on the caller's own records.
pub mod application;
pub mod whoami;

pub use application::{application_get, application_put, section_get, section_put};
pub use whoami::whoami;
