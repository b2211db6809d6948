//! Role gates for the three screens: login, applicant self-service and
//! admin management.

use async_trait::async_trait;

use crate::session::{Profile, Role};

pub const LOGIN_ROUTE: &str = "/login";
pub const APPLICANT_HOME: &str = "/app";
pub const ADMIN_HOME: &str = "/admin";

impl Role {
    pub fn home_route(self) -> &'static str {
        match self {
            Role::Admin => ADMIN_HOME,
            Role::Applicant => APPLICANT_HOME,
        }
    }
}

/// Anything that can produce the caller's settled profile.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn current_profile(&self) -> Option<Profile>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Authenticated,
    AdminOnly,
    ApplicantOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Allow(Profile),
    RedirectToLogin,
    /// Signed in, wrong area: send the caller to their own home.
    RedirectToHome(Role),
}

impl GuardOutcome {
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            GuardOutcome::Allow(_) => None,
            GuardOutcome::RedirectToLogin => Some(LOGIN_ROUTE),
            GuardOutcome::RedirectToHome(role) => Some(role.home_route()),
        }
    }
}

impl Guard {
    /// Always waits for the source to settle before deciding.
    pub async fn check<S: ProfileSource + ?Sized>(self, source: &S) -> GuardOutcome {
        evaluate(self, source.current_profile().await)
    }
}

pub fn evaluate(guard: Guard, profile: Option<Profile>) -> GuardOutcome {
    let Some(profile) = profile else {
        return GuardOutcome::RedirectToLogin;
    };
    match (guard, profile.role) {
        (Guard::Authenticated, _) | (Guard::AdminOnly, Role::Admin) | (Guard::ApplicantOnly, Role::Applicant) => {
            GuardOutcome::Allow(profile)
        }
        (_, role) => GuardOutcome::RedirectToHome(role),
    }
}
