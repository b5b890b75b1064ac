//! Navigation boundary between the client core and whatever renders views.
//! Routes are plain values; the renderer implements [`Navigator`].

use std::fmt::{Display, Formatter};

use parking_lot::Mutex;
use tracing::debug;

use crate::identity::AccessGuard;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Races,
    Applications,
    /// Application form for one race.
    ApplyForRace(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Races => "/races".to_string(),
            Route::Applications => "/applications".to_string(),
            Route::ApplyForRace(id) => format!("/races/{}/apply", id),
        }
    }

    /// Resolve a path. The empty path and anything unknown land on the dashboard.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segs.as_slice() {
            ["login"] => Route::Login,
            ["dashboard"] => Route::Dashboard,
            ["races"] => Route::Races,
            ["applications"] => Route::Applications,
            ["races", id, "apply"] => Route::ApplyForRace((*id).to_string()),
            _ => Route::Dashboard,
        }
    }

    pub fn is_protected(&self) -> bool { !matches!(self, Route::Login) }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(&self.path()) }
}

/// Receives navigation requests from the core (guard redirects, form flows).
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that only remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    requests: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self { Self::default() }

    pub fn requests(&self) -> Vec<Route> { self.requests.lock().clone() }

    pub fn count(&self) -> usize { self.requests.lock().len() }

    pub fn last(&self) -> Option<Route> { self.requests.lock().last().cloned() }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        debug!(target: "trail::nav", "navigate {}", route);
        self.requests.lock().push(route);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Allowed(Route),
    Denied,
}

/// Ask for entry to `route`, consulting the guard only for protected routes.
pub fn enter(route: Route, guard: &AccessGuard) -> Entry {
    if route.is_protected() && !guard.can_enter() {
        return Entry::Denied;
    }
    Entry::Allowed(route)
}
