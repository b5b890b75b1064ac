use std::sync::Arc;

use tracing::{debug, info};

use super::session::{GuardPolicy, SessionManager};
use crate::navigation::{Navigator, Route};

/// Gate evaluated before a protected view is entered.
///
/// With the default [`GuardPolicy::TokenPresent`] an expired but present token
/// still gets through; `SessionManager::is_authenticated` would say no for the
/// same token. Use [`AccessGuard::with_policy`] to make the two agree.
pub struct AccessGuard {
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
    policy: GuardPolicy,
}

impl AccessGuard {
    pub fn new(session: Arc<SessionManager>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator, policy: GuardPolicy::default() }
    }

    pub fn with_policy(mut self, policy: GuardPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> GuardPolicy { self.policy }

    /// True when entry is allowed. On denial asks the navigator for the login
    /// view once and returns false.
    pub fn can_enter(&self) -> bool {
        debug!(target: "trail::guard", policy = ?self.policy, "access guard check");
        if self.session.satisfies(self.policy) {
            return true;
        }
        info!(target: "trail::guard", "entry denied; redirecting to {}", Route::Login);
        self.navigator.navigate(Route::Login);
        false
    }
}
