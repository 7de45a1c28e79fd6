//! Navigation-time access control.
//!
//! The guard re-derives session validity on every navigation from the
//! credential in the session context. It never blocks and never reports an
//! error to the user: any problem with the credential becomes a redirect to
//! the login entry point.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::route::Route;
use super::session::SessionContext;
use super::token::{TokenClaims, TokenError};

/// Why the guard refused a protected route
#[derive(Debug, Clone, PartialEq)]
pub enum DenyReason {
    MissingCredential,
    MalformedCredential(TokenError),
    ExpiredCredential,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Render(Route),
    Redirect { to: Route, reason: DenyReason },
}

impl GuardDecision {
    /// The route that should actually be shown
    pub fn route(&self) -> Route {
        match self {
            GuardDecision::Render(route) => *route,
            GuardDecision::Redirect { to, .. } => *to,
        }
    }

    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render(_))
    }
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    session: Arc<SessionContext>,
}

impl SessionGuard {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self { session }
    }

    /// Decide whether `route` may render now.
    pub fn check(&self, route: Route) -> GuardDecision {
        self.check_at(route, Utc::now())
    }

    /// Decide whether `route` may render at instant `now`.
    ///
    /// Malformed and expired credentials are cleared from the session.
    pub fn check_at(&self, route: Route, now: DateTime<Utc>) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Render(route);
        }

        let Some(token) = self.session.token() else {
            return self.redirect(route, DenyReason::MissingCredential);
        };

        match TokenClaims::decode(&token) {
            Ok(claims) if claims.is_expired_at(now) => {
                self.clear_session();
                self.redirect(route, DenyReason::ExpiredCredential)
            }
            Ok(_) => GuardDecision::Render(route),
            Err(e) => {
                self.clear_session();
                self.redirect(route, DenyReason::MalformedCredential(e))
            }
        }
    }

    fn clear_session(&self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
    }

    fn redirect(&self, requested: Route, reason: DenyReason) -> GuardDecision {
        debug!(route = %requested, ?reason, "Redirecting to login");
        GuardDecision::Redirect {
            to: Route::LOGIN_ENTRY,
            reason,
        }
    }
}
