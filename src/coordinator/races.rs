use std::sync::Arc;

use tracing::{info, warn};

use super::Notice;
use crate::error::{AppError, AppResult};
use crate::gateway::{Race, RaceDraft, RaceGateway};
use crate::identity::SessionManager;

pub struct RaceListView {
    races: RaceGateway,
    session: Arc<SessionManager>,
    items: Vec<Race>,
    loading: bool,
    notice: Option<Notice>,
}

impl RaceListView {
    pub fn new(races: RaceGateway, session: Arc<SessionManager>) -> Self {
        Self { races, session, items: Vec::new(), loading: false, notice: None }
    }

    pub fn items(&self) -> &[Race] { &self.items }

    pub fn is_loading(&self) -> bool { self.loading }

    pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

    pub fn take_notice(&mut self) -> Option<Notice> { self.notice.take() }

    /// Create/update/delete controls are shown to administrators only.
    pub fn can_manage(&self) -> bool { self.session.is_admin() }

    fn require_manage(&mut self) -> AppResult<()> {
        if self.can_manage() {
            return Ok(());
        }
        let err = AppError::user("forbidden", "administrator role required");
        self.notice = Some(Notice::failure("race management", &err));
        Err(err)
    }

    /// Replace the displayed list with a fresh read. Keeps the old list on failure.
    pub async fn load(&mut self) -> AppResult<()> {
        self.loading = true;
        let res = self.races.get_all().await;
        self.loading = false;
        match res {
            Ok(list) => {
                self.items = list;
                Ok(())
            }
            Err(e) => {
                warn!(target: "trail::view", "loading races failed: {}", e);
                self.notice = Some(Notice::failure("loading races", &e));
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, draft: RaceDraft) -> AppResult<Race> {
        self.require_manage()?;
        if let Err(e) = draft.validate() {
            self.notice = Some(Notice::failure("creating race", &e));
            return Err(e);
        }
        match self.races.create(&draft).await {
            Ok(race) => {
                info!(target: "trail::view", id = %race.id, name = %race.name, "race created");
                self.notice = Some(Notice::Info(format!("race '{}' created", race.name)));
                // A failed refresh already leaves its own notice.
                let _ = self.load().await;
                Ok(race)
            }
            Err(e) => {
                self.notice = Some(Notice::failure("creating race", &e));
                Err(e)
            }
        }
    }

    pub async fn update(&mut self, race: Race) -> AppResult<Race> {
        self.require_manage()?;
        if let Err(e) = RaceDraft::new(race.name.clone(), race.distance).validate() {
            self.notice = Some(Notice::failure("updating race", &e));
            return Err(e);
        }
        match self.races.update(&race.id, &race).await {
            Ok(updated) => {
                self.notice = Some(Notice::Info(format!("race '{}' updated", updated.name)));
                let _ = self.load().await;
                Ok(updated)
            }
            Err(e) => {
                self.notice = Some(Notice::failure("updating race", &e));
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, id: &str) -> AppResult<()> {
        self.require_manage()?;
        match self.races.delete(id).await {
            Ok(()) => {
                info!(target: "trail::view", id, "race deleted");
                self.notice = Some(Notice::Info("race deleted".to_string()));
                let _ = self.load().await;
                Ok(())
            }
            Err(e) => {
                self.notice = Some(Notice::failure("deleting race", &e));
                Err(e)
            }
        }
    }
}
