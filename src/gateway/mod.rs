//! Dual-channel data gateway.
//!
//! Each entity kind talks to two services: writes (create/update/delete) go to
//! the command channel, reads (list/get) go to the query channel. The query
//! side may lag the command side. The gateway does not hide that: it keeps no
//! cache, merges nothing optimistically and never retries. Every call is a
//! fresh round trip and every failure comes back as `AppError::Transport`.

mod auth;
pub mod model;

use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

pub use auth::{StaticToken, TokenSource};
pub use model::{Application, ApplicationDraft, Distance, Race, RaceDraft, MAX_TEXT_LEN};

/// Base addresses of one entity kind's command and query channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels {
    pub command: Url,
    pub query: Url,
}

impl Channels {
    pub fn new(command: &str, query: &str) -> AppResult<Self> {
        Ok(Self { command: parse_url(command)?, query: parse_url(query)? })
    }

    /// Both channels for `entity`, given service-level base addresses
    /// (`<base>/<entity>`).
    pub fn for_entity(command_base: &Url, query_base: &Url, entity: &str) -> AppResult<Self> {
        Ok(Self {
            command: join_segments(command_base, &[entity])?,
            query: join_segments(query_base, &[entity])?,
        })
    }

    /// Point both channels at one address; handy for a single fixture service.
    pub fn same(base: &Url) -> Self { Self { command: base.clone(), query: base.clone() } }
}

pub(crate) fn parse_url(s: &str) -> AppResult<Url> {
    Url::parse(s.trim()).map_err(|e| AppError::config("invalid_url".to_string(), format!("'{}': {}", s, e)))
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn join_segments(base: &Url, segs: &[&str]) -> AppResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| AppError::config("invalid_url".to_string(), format!("'{}' cannot carry a path", base)))?;
        path.pop_if_empty();
        for s in segs {
            path.push(s);
        }
    }
    Ok(url)
}

// A blank id would address the collection itself.
fn require_id(id: &str) -> AppResult<&str> {
    if id.trim().is_empty() {
        return Err(AppError::user("id_required", "a record id is required"));
    }
    Ok(id)
}

/// One kind of record served by the registration service.
pub trait Entity: Send + Sync + 'static {
    /// Path segment under the service base, e.g. `races`.
    const PATH: &'static str;
    type Draft: Serialize + Send + Sync;
    /// Full record. `update` always sends one of these whole.
    type Record: Serialize + DeserializeOwned + Clone + Send + Sync;

    fn record_id(record: &Self::Record) -> &str;
}

#[derive(Debug, Clone, Copy)]
pub struct Races;

impl Entity for Races {
    const PATH: &'static str = "races";
    type Draft = RaceDraft;
    type Record = Race;

    fn record_id(record: &Race) -> &str { &record.id }
}

#[derive(Debug, Clone, Copy)]
pub struct Applications;

impl Entity for Applications {
    const PATH: &'static str = "applications";
    type Draft = ApplicationDraft;
    type Record = Application;

    fn record_id(record: &Application) -> &str { &record.id }
}

pub type RaceGateway = Gateway<Races>;
pub type ApplicationGateway = Gateway<Applications>;

pub struct Gateway<E: Entity> {
    client: reqwest::Client,
    channels: Channels,
    tokens: Arc<dyn TokenSource>,
    _kind: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Gateway<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            channels: self.channels.clone(),
            tokens: self.tokens.clone(),
            _kind: PhantomData,
        }
    }
}

impl<E: Entity> Gateway<E> {
    pub fn new(channels: Channels, tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_client(reqwest::Client::new(), channels, tokens)
    }

    /// Reuse a caller-built client (connection pool, TLS or timeout policy).
    pub fn with_client(client: reqwest::Client, channels: Channels, tokens: Arc<dyn TokenSource>) -> Self {
        Self { client, channels, tokens, _kind: PhantomData }
    }

    pub fn channels(&self) -> &Channels { &self.channels }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(target: "trail::gateway", entity = E::PATH, %method, %url, "request");
        auth::attach_bearer(self.client.request(method, url), self.tokens.as_ref())
    }

    async fn send(&self, op: &'static str, rb: RequestBuilder) -> AppResult<Response> {
        let result = match rb.send().await {
            Ok(resp) => resp.error_for_status(),
            Err(e) => Err(e),
        };
        result.map_err(|e| {
            warn!(target: "trail::gateway", entity = E::PATH, op, "request failed: {}", e);
            AppError::from(e)
        })
    }

    async fn read_json<T: DeserializeOwned>(&self, op: &'static str, resp: Response) -> AppResult<T> {
        resp.json::<T>().await.map_err(|e| {
            warn!(target: "trail::gateway", entity = E::PATH, op, "undecodable response body: {}", e);
            AppError::from(e)
        })
    }

    pub async fn create(&self, draft: &E::Draft) -> AppResult<E::Record> {
        let rb = self.request(Method::POST, self.channels.command.clone()).json(draft);
        let resp = self.send("create", rb).await?;
        let rec: E::Record = self.read_json("create", resp).await?;
        debug!(target: "trail::gateway", entity = E::PATH, id = E::record_id(&rec), "created");
        Ok(rec)
    }

    /// Whole collection from the query channel, in whatever order it comes.
    pub async fn get_all(&self) -> AppResult<Vec<E::Record>> {
        let rb = self.request(Method::GET, self.channels.query.clone());
        let resp = self.send("get_all", rb).await?;
        self.read_json("get_all", resp).await
    }

    /// Unknown ids fail like any other transport error.
    pub async fn get_one(&self, id: &str) -> AppResult<E::Record> {
        let url = join_segments(&self.channels.query, &[require_id(id)?])?;
        let resp = self.send("get_one", self.request(Method::GET, url)).await?;
        self.read_json("get_one", resp).await
    }

    /// PATCH the full record to the command channel.
    pub async fn update(&self, id: &str, record: &E::Record) -> AppResult<E::Record> {
        let url = join_segments(&self.channels.command, &[require_id(id)?])?;
        let rb = self.request(Method::PATCH, url).json(record);
        let resp = self.send("update", rb).await?;
        self.read_json("update", resp).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let url = join_segments(&self.channels.command, &[require_id(id)?])?;
        self.send("delete", self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

impl Gateway<Applications> {
    /// Applications for one race, from the query channel's by-race listing.
    pub async fn for_race(&self, race_id: &str) -> AppResult<Vec<Application>> {
        let url = join_segments(&self.channels.query, &["race", require_id(race_id)?])?;
        let resp = self.send("for_race", self.request(Method::GET, url)).await?;
        self.read_json("for_race", resp).await
    }
}
