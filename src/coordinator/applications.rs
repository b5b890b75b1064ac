use std::sync::Arc;

use tracing::{info, warn};

use super::Notice;
use crate::error::{AppError, AppResult};
use crate::gateway::{Application, ApplicationDraft, ApplicationGateway, Race, RaceGateway};
use crate::navigation::{Navigator, Route};

pub struct ApplicationListView {
    apps: ApplicationGateway,
    race_filter: Option<String>,
    items: Vec<Application>,
    notice: Option<Notice>,
}

impl ApplicationListView {
    pub fn new(apps: ApplicationGateway) -> Self {
        Self { apps, race_filter: None, items: Vec::new(), notice: None }
    }

    /// Restrict loads to one race's applications.
    pub fn for_race(apps: ApplicationGateway, race_id: impl Into<String>) -> Self {
        Self { race_filter: Some(race_id.into()), ..Self::new(apps) }
    }

    pub fn items(&self) -> &[Application] { &self.items }

    pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

    pub fn take_notice(&mut self) -> Option<Notice> { self.notice.take() }

    pub async fn load(&mut self) -> AppResult<()> {
        let res = match &self.race_filter {
            Some(race_id) => self.apps.for_race(race_id).await,
            None => self.apps.get_all().await,
        };
        match res {
            Ok(list) => {
                self.items = list;
                Ok(())
            }
            Err(e) => {
                warn!(target: "trail::view", "loading applications failed: {}", e);
                self.notice = Some(Notice::failure("loading applications", &e));
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, id: &str) -> AppResult<()> {
        match self.apps.delete(id).await {
            Ok(()) => {
                info!(target: "trail::view", id, "application deleted");
                self.notice = Some(Notice::Info("application deleted".to_string()));
                let _ = self.load().await;
                Ok(())
            }
            Err(e) => {
                self.notice = Some(Notice::failure("deleting application", &e));
                Err(e)
            }
        }
    }
}

/// Sign-up form for one race.
pub struct ApplicationFormView {
    apps: ApplicationGateway,
    races: RaceGateway,
    navigator: Arc<dyn Navigator>,
    race_id: Option<String>,
    race: Option<Race>,
    submitting: bool,
    notice: Option<Notice>,
}

impl ApplicationFormView {
    pub fn new(apps: ApplicationGateway, races: RaceGateway, navigator: Arc<dyn Navigator>) -> Self {
        Self { apps, races, navigator, race_id: None, race: None, submitting: false, notice: None }
    }

    pub fn race(&self) -> Option<&Race> { self.race.as_ref() }

    pub fn is_submitting(&self) -> bool { self.submitting }

    pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

    /// Load the race being applied for. On failure goes back to the race list.
    pub async fn open(&mut self, race_id: &str) -> AppResult<()> {
        self.race_id = Some(race_id.to_string());
        match self.races.get_one(race_id).await {
            Ok(race) => {
                self.race = Some(race);
                Ok(())
            }
            Err(e) => {
                warn!(target: "trail::view", race_id, "loading race for application failed: {}", e);
                self.notice = Some(Notice::failure("loading race", &e));
                self.navigator.navigate(Route::Races);
                Err(e)
            }
        }
    }

    pub async fn submit(&mut self, first_name: &str, last_name: &str, club: Option<&str>) -> AppResult<Application> {
        let Some(race_id) = self.race_id.clone() else {
            let err = AppError::user("race_required", "open a race before applying");
            self.notice = Some(Notice::failure("submitting application", &err));
            return Err(err);
        };
        let draft = ApplicationDraft {
            race_id,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            club: club.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string),
        };
        if let Err(e) = draft.validate() {
            self.notice = Some(Notice::failure("submitting application", &e));
            return Err(e);
        }
        self.submitting = true;
        match self.apps.create(&draft).await {
            Ok(app) => {
                info!(target: "trail::view", id = %app.id, race_id = %draft.race_id, "application submitted");
                self.notice = Some(Notice::Info("application submitted".to_string()));
                self.submitting = false;
                self.navigator.navigate(Route::Applications);
                Ok(app)
            }
            Err(e) => {
                self.notice = Some(Notice::failure("submitting application", &e));
                self.submitting = false;
                Err(e)
            }
        }
    }
}
