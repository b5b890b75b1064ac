use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use super::Notice;
use crate::gateway::{ApplicationGateway, RaceGateway};
use crate::identity::{Identity, SessionManager};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_races: usize,
    pub total_applications: usize,
    /// Distinct first+last name pairs. Only computed for administrators.
    pub unique_applicants: Option<usize>,
}

pub struct DashboardView {
    session: Arc<SessionManager>,
    races: RaceGateway,
    apps: ApplicationGateway,
    user: Option<Identity>,
    stats: DashboardStats,
    notice: Option<Notice>,
}

impl DashboardView {
    pub fn new(session: Arc<SessionManager>, races: RaceGateway, apps: ApplicationGateway) -> Self {
        Self { session, races, apps, user: None, stats: DashboardStats::default(), notice: None }
    }

    pub fn user(&self) -> Option<&Identity> { self.user.as_ref() }

    pub fn stats(&self) -> &DashboardStats { &self.stats }

    pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

    /// Refresh both counters. Each one keeps its previous value if its read fails.
    pub async fn load(&mut self) {
        self.user = self.session.current_user();
        let (races, apps) = tokio::join!(self.races.get_all(), self.apps.get_all());

        match races {
            Ok(list) => self.stats.total_races = list.len(),
            Err(e) => {
                warn!(target: "trail::view", "dashboard races failed: {}", e);
                self.notice = Some(Notice::failure("loading races", &e));
            }
        }
        match apps {
            Ok(list) => {
                self.stats.total_applications = list.len();
                self.stats.unique_applicants = if self.session.is_admin() {
                    let names: HashSet<(String, String)> =
                        list.iter().map(|a| (a.first_name.clone(), a.last_name.clone())).collect();
                    Some(names.len())
                } else {
                    None
                };
            }
            Err(e) => {
                warn!(target: "trail::view", "dashboard applications failed: {}", e);
                self.notice = Some(Notice::failure("loading applications", &e));
            }
        }
    }
}
