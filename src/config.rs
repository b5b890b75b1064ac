//! Client configuration: service base addresses and the local state directory.
//! Values come from the environment with local-development defaults.

use std::path::PathBuf;

use reqwest::Url;

use crate::error::AppResult;
use crate::gateway::{parse_url, Applications, Channels, Entity, Races};

pub const ENV_COMMAND_URL: &str = "TRAIL_COMMAND_URL";
pub const ENV_QUERY_URL: &str = "TRAIL_QUERY_URL";
pub const ENV_STATE_DIR: &str = "TRAIL_STATE_DIR";

pub const DEFAULT_COMMAND_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_QUERY_URL: &str = "http://localhost:8081/api";
pub const DEFAULT_STATE_DIR: &str = ".trail";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub command_base: Url,
    pub query_base: Url,
    pub state_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str, default: &str| {
            lookup(k).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
        };
        Ok(Self {
            command_base: parse_url(&get(ENV_COMMAND_URL, DEFAULT_COMMAND_URL))?,
            query_base: parse_url(&get(ENV_QUERY_URL, DEFAULT_QUERY_URL))?,
            state_dir: PathBuf::from(get(ENV_STATE_DIR, DEFAULT_STATE_DIR)),
        })
    }

    pub fn race_channels(&self) -> AppResult<Channels> {
        Channels::for_entity(&self.command_base, &self.query_base, Races::PATH)
    }

    pub fn application_channels(&self) -> AppResult<Channels> {
        Channels::for_entity(&self.command_base, &self.query_base, Applications::PATH)
    }
}
