// handlers/mod.rs - handlers grouped by the guard in front of them
//
// Public (no session) → Protected (any profile, or applicant-only) → Admin
pub mod admin;
pub mod protected;
pub mod public;
