//! Command-line front end over the client core.
//!
//! Arguments are parsed by hand into a [`Command`]; [`CliApp::run`] executes it
//! through the session manager, the access guard and the view coordinators and
//! returns the text to print.

pub mod outputformatter;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::coordinator::{ApplicationFormView, ApplicationListView, DashboardView, Notice, RaceListView};
use crate::error::{AppError, AppResult};
use crate::gateway::{ApplicationGateway, Distance, Race, RaceDraft, RaceGateway, TokenSource};
use crate::identity::{dev_token, AccessGuard, FileTokenStore, Role, SessionManager};
use crate::navigation::{self, Entry, RecordingNavigator, Route};

pub use outputformatter::{applications_table, identity_table, races_table, render_table};

const DEFAULT_DEV_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoginToken(String),
    LoginDev { role: Role, user: String, ttl_hours: i64 },
    Logout,
    WhoAmI,
    Dashboard,
    RaceList,
    RaceGet(String),
    RaceCreate { name: String, distance: Distance },
    RaceUpdate { id: String, name: String, distance: Distance },
    RaceDelete(String),
    ApplicationList,
    ApplicationsByRace(String),
    ApplicationCreate { race_id: String, first_name: String, last_name: String, club: Option<String> },
    ApplicationDelete(String),
    Help,
}

impl Command {
    /// View a command belongs to; `None` for commands open to anonymous users.
    pub fn route(&self) -> Option<Route> {
        match self {
            Command::LoginToken(_) | Command::LoginDev { .. } | Command::Logout | Command::WhoAmI | Command::Help => None,
            Command::Dashboard => Some(Route::Dashboard),
            Command::RaceList | Command::RaceGet(_) | Command::RaceCreate { .. } | Command::RaceUpdate { .. } | Command::RaceDelete(_) => Some(Route::Races),
            Command::ApplicationCreate { race_id, .. } => Some(Route::ApplyForRace(race_id.clone())),
            Command::ApplicationList | Command::ApplicationsByRace(_) | Command::ApplicationDelete(_) => Some(Route::Applications),
        }
    }
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage:\n  {p} login --token <token>\n  {p} login --role <ADMINISTRATOR|APPLICANT> [--user <name>] [--ttl-hours <n>]\n  {p} logout\n  {p} whoami\n  {p} dashboard\n  {p} races list | get <id> | create <name> <distance> | update <id> <name> <distance> | delete <id>\n  {p} applications list | by-race <raceId> | create <raceId> <firstName> <lastName> [club] | delete <id>\n\nDistances: FiveK, TenK, HalfMarathon, Marathon (or 5K, 10K, \"Half Marathon\")\n\nEnvironment:\n  TRAIL_COMMAND_URL   command service base (default http://localhost:8080/api)\n  TRAIL_QUERY_URL     query service base (default http://localhost:8081/api)\n  TRAIL_STATE_DIR     directory holding the token slot (default .trail)",
        p = program
    )
}

fn need<'a>(args: &'a [String], i: usize, what: &str) -> Result<&'a str, String> {
    args.get(i).map(String::as_str).ok_or_else(|| format!("missing {}", what))
}

fn parse_distance(s: &str) -> Result<Distance, String> {
    s.parse::<Distance>().map_err(|e| e.message().to_string())
}

/// Program name and the remaining arguments. An empty argv is allowed.
pub fn split_program(argv: &[String]) -> (String, &[String]) {
    match argv.split_first() {
        Some((program, rest)) => (program.clone(), rest),
        None => ("trail_cli".to_string(), &[]),
    }
}

/// Parse arguments (program name already removed).
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(first) = args.first() else { return Ok(Command::Help) };
    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "login" => parse_login(&args[1..]),
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::WhoAmI),
        "dashboard" => Ok(Command::Dashboard),
        "races" => match need(args, 1, "races subcommand")? {
            "list" => Ok(Command::RaceList),
            "get" => Ok(Command::RaceGet(need(args, 2, "race id")?.to_string())),
            "create" => Ok(Command::RaceCreate {
                name: need(args, 2, "race name")?.to_string(),
                distance: parse_distance(need(args, 3, "distance")?)?,
            }),
            "update" => Ok(Command::RaceUpdate {
                id: need(args, 2, "race id")?.to_string(),
                name: need(args, 3, "race name")?.to_string(),
                distance: parse_distance(need(args, 4, "distance")?)?,
            }),
            "delete" => Ok(Command::RaceDelete(need(args, 2, "race id")?.to_string())),
            other => Err(format!("unknown races subcommand '{}'", other)),
        },
        "applications" => match need(args, 1, "applications subcommand")? {
            "list" => Ok(Command::ApplicationList),
            "by-race" => Ok(Command::ApplicationsByRace(need(args, 2, "race id")?.to_string())),
            "create" => Ok(Command::ApplicationCreate {
                race_id: need(args, 2, "race id")?.to_string(),
                first_name: need(args, 3, "first name")?.to_string(),
                last_name: need(args, 4, "last name")?.to_string(),
                club: args.get(5).cloned(),
            }),
            "delete" => Ok(Command::ApplicationDelete(need(args, 2, "application id")?.to_string())),
            other => Err(format!("unknown applications subcommand '{}'", other)),
        },
        other => Err(format!("unrecognized command '{}'", other)),
    }
}

fn parse_login(args: &[String]) -> Result<Command, String> {
    let mut token: Option<String> = None;
    let mut role: Option<Role> = None;
    let mut user: Option<String> = None;
    let mut ttl_hours = DEFAULT_DEV_TTL_HOURS;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--token" => { token = Some(need(args, i + 1, "--token value")?.to_string()); i += 2; }
            "--role" => { role = Some(need(args, i + 1, "--role value")?.parse::<Role>()?); i += 2; }
            "--user" => { user = Some(need(args, i + 1, "--user value")?.to_string()); i += 2; }
            "--ttl-hours" => {
                let v = need(args, i + 1, "--ttl-hours value")?;
                ttl_hours = v.parse::<i64>().map_err(|_| format!("invalid --ttl-hours '{}'", v))?;
                if ttl_hours <= 0 {
                    return Err(format!("--ttl-hours must be positive, got {}", ttl_hours));
                }
                i += 2;
            }
            unk => return Err(format!("unrecognized login argument '{}'", unk)),
        }
    }
    match (token, role) {
        (Some(t), None) => Ok(Command::LoginToken(t)),
        (None, Some(role)) => {
            let user = user.unwrap_or_else(|| match role {
                Role::Administrator => "admin".to_string(),
                Role::Applicant => "applicant".to_string(),
            });
            Ok(Command::LoginDev { role, user, ttl_hours })
        }
        (Some(_), Some(_)) => Err("use either --token or --role, not both".to_string()),
        (None, None) => Err("login requires --token or --role".to_string()),
    }
}

/// Wiring of the client core for one CLI invocation.
pub struct CliApp {
    session: Arc<SessionManager>,
    navigator: Arc<RecordingNavigator>,
    guard: AccessGuard,
    races: RaceGateway,
    apps: ApplicationGateway,
}

impl CliApp {
    pub fn from_config(cfg: &ClientConfig) -> AppResult<Self> {
        let session = Arc::new(SessionManager::new(Arc::new(FileTokenStore::new(&cfg.state_dir))));
        Self::with_session(cfg, session)
    }

    pub fn with_session(cfg: &ClientConfig, session: Arc<SessionManager>) -> AppResult<Self> {
        let navigator = Arc::new(RecordingNavigator::new());
        let guard = AccessGuard::new(session.clone(), navigator.clone());
        let tokens: Arc<dyn TokenSource> = session.clone();
        let races = RaceGateway::new(cfg.race_channels()?, tokens.clone());
        let apps = ApplicationGateway::new(cfg.application_channels()?, tokens);
        Ok(Self { session, navigator, guard, races, apps })
    }

    pub fn session(&self) -> &Arc<SessionManager> { &self.session }

    /// Routes requested during this run (guard redirects, form flows).
    pub fn navigation(&self) -> Vec<Route> { self.navigator.requests() }

    fn enter(&self, cmd: &Command) -> AppResult<()> {
        let Some(route) = cmd.route() else { return Ok(()) };
        match navigation::enter(route, &self.guard) {
            Entry::Allowed(_) => Ok(()),
            Entry::Denied => Err(AppError::user("login_required", "not logged in; run `login` first")),
        }
    }

    pub async fn run(&self, cmd: Command) -> AppResult<String> {
        self.enter(&cmd)?;
        match cmd {
            Command::Help => Ok(usage("trail_cli")),
            Command::LoginToken(t) => {
                self.session.set_token(&t);
                Ok(self.login_summary())
            }
            Command::LoginDev { role, user, ttl_hours } => {
                let exp = dev_expiry(chrono::Utc::now().timestamp(), ttl_hours)?;
                self.session.set_token(&dev_token(&user, role, exp));
                Ok(self.login_summary())
            }
            Command::Logout => {
                self.session.logout();
                Ok("logged out".to_string())
            }
            Command::WhoAmI => match self.session.current_user() {
                Some(id) => Ok(identity_table(&id, self.session.is_authenticated())),
                None => Ok("anonymous".to_string()),
            },
            Command::Dashboard => {
                let mut view = DashboardView::new(self.session.clone(), self.races.clone(), self.apps.clone());
                view.load().await;
                let s = view.stats();
                let mut rows = vec![
                    vec!["races".to_string(), s.total_races.to_string()],
                    vec!["applications".to_string(), s.total_applications.to_string()],
                ];
                if let Some(u) = s.unique_applicants {
                    rows.push(vec!["unique applicants".to_string(), u.to_string()]);
                }
                Ok(with_notice(render_table(&["metric", "value"], &rows), view.notice()))
            }
            Command::RaceList => {
                let mut view = RaceListView::new(self.races.clone(), self.session.clone());
                view.load().await?;
                Ok(races_table(view.items()))
            }
            Command::RaceGet(id) => {
                let race = self.races.get_one(&id).await?;
                Ok(races_table(std::slice::from_ref(&race)))
            }
            Command::RaceCreate { name, distance } => {
                let mut view = RaceListView::new(self.races.clone(), self.session.clone());
                view.create(RaceDraft::new(name, distance)).await?;
                Ok(with_notice(races_table(view.items()), view.notice()))
            }
            Command::RaceUpdate { id, name, distance } => {
                let mut view = RaceListView::new(self.races.clone(), self.session.clone());
                view.update(Race { id, name, distance }).await?;
                Ok(with_notice(races_table(view.items()), view.notice()))
            }
            Command::RaceDelete(id) => {
                let mut view = RaceListView::new(self.races.clone(), self.session.clone());
                view.delete(&id).await?;
                Ok(with_notice(races_table(view.items()), view.notice()))
            }
            Command::ApplicationList => {
                let mut view = ApplicationListView::new(self.apps.clone());
                view.load().await?;
                Ok(applications_table(view.items()))
            }
            Command::ApplicationsByRace(race_id) => {
                let mut view = ApplicationListView::for_race(self.apps.clone(), race_id);
                view.load().await?;
                Ok(applications_table(view.items()))
            }
            Command::ApplicationCreate { race_id, first_name, last_name, club } => {
                let mut form = ApplicationFormView::new(self.apps.clone(), self.races.clone(), self.navigator.clone());
                form.open(&race_id).await?;
                let app = form.submit(&first_name, &last_name, club.as_deref()).await?;
                Ok(with_notice(applications_table(std::slice::from_ref(&app)), form.notice()))
            }
            Command::ApplicationDelete(id) => {
                let mut view = ApplicationListView::new(self.apps.clone());
                view.delete(&id).await?;
                Ok(with_notice(applications_table(view.items()), view.notice()))
            }
        }
    }

    fn login_summary(&self) -> String {
        match self.session.current_user() {
            Some(id) => format!("logged in as {} ({})", id.username, id.role),
            None => "token stored, but it carries no usable identity".to_string(),
        }
    }
}

/// Expiry `ttl_hours` after `now`, refusing lifetimes that are not positive or overflow.
fn dev_expiry(now: i64, ttl_hours: i64) -> AppResult<i64> {
    if ttl_hours <= 0 {
        return Err(AppError::user("invalid_ttl".to_string(), format!("token lifetime must be positive, got {} hours", ttl_hours)));
    }
    ttl_hours
        .checked_mul(3600)
        .and_then(|secs| now.checked_add(secs))
        .ok_or_else(|| AppError::user("invalid_ttl".to_string(), format!("token lifetime of {} hours is too large", ttl_hours)))
}

fn with_notice(body: String, notice: Option<&Notice>) -> String {
    match notice {
        Some(n) => format!("{}\n{}", n.text(), body),
        None => body,
    }
}
