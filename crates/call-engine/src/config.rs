//! # Call Center Configuration
//!
//! Configuration is split into sections:
//!
//! - [`GeneralConfig`]: greeting played to callers, recents recording
//! - [`RoutingUrls`]: platform callback URLs used in redirect instructions
//! - [`StorageConfig`]: which backend holds the queues and the live call pool
//!
//! ```
//! use switchboard_call_engine::config::{CallCenterConfig, StorageBackend};
//!
//! let mut config = CallCenterConfig::default();
//! config.storage.backend = StorageBackend::Sqlite;
//! config.storage.database_url = "sqlite::memory:".to_string();
//! config.validate().expect("valid configuration");
//! ```

use std::env;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CallCenterError, Result};
use crate::gateway::GreetingSpec;

pub const DEFAULT_HOLD_MUSIC_URL: &str =
    "http://com.twilio.music.ambient.s3.amazonaws.com/aerosolspray_-_Living_Taciturn.mp3";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallCenterConfig {
    pub general: GeneralConfig,
    pub urls: RoutingUrls,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Played to callers entering the inbound queue
    pub greeting: GreetingSpec,
    /// Post completed calls to the recents collection, when one is configured
    pub record_recents: bool,
}

/// Callback URLs handed to the platform in redirect instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingUrls {
    /// Where a call is redirected when it is placed on hold
    pub hold_url: String,
    /// Where a call is redirected to reach an agent; receives `username` and `call`
    pub call_connect_url: String,
    /// Audio looped while a call waits on hold
    pub on_hold_music_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
    pub inbound_table: String,
    pub hold_table: String,
    pub live_table: String,
}

impl CallCenterConfig {
    /// Builds a configuration from the deployment environment
    ///
    /// Reads `GREETING_TYPE` / `GREETING_VALUE`, `HOLD_URL`, `CALL_CONNECT_URL`,
    /// `ON_HOLD_MUSIC_URL` and `DATABASE_URL`; unset variables keep their defaults.
    /// A `DATABASE_URL` selects the SQLite backend.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = env::var("GREETING_VALUE") {
            config.general.greeting = match env::var("GREETING_TYPE").as_deref() {
                Ok("url") => GreetingSpec::Url(value),
                Ok("text") | Err(_) => GreetingSpec::Text(value),
                Ok(other) => {
                    return Err(CallCenterError::configuration(format!(
                        "Unknown GREETING_TYPE: {}",
                        other
                    )))
                }
            };
        }
        if let Ok(url) = env::var("HOLD_URL") {
            config.urls.hold_url = url;
        }
        if let Ok(url) = env::var("CALL_CONNECT_URL") {
            config.urls.call_connect_url = url;
        }
        if let Ok(url) = env::var("ON_HOLD_MUSIC_URL") {
            config.urls.on_hold_music_url = url;
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            config.storage.backend = StorageBackend::Sqlite;
            config.storage.database_url = url;
        }

        config.validate().map_err(CallCenterError::configuration)?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CallCenterError::configuration(format!("Invalid configuration: {}", e)))?;
        config.validate().map_err(CallCenterError::configuration)?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let greeting = match &self.general.greeting {
            GreetingSpec::Text(value) | GreetingSpec::Url(value) => value,
        };
        if greeting.trim().is_empty() {
            return Err("greeting value cannot be empty".to_string());
        }

        for (name, url) in [
            ("hold_url", &self.urls.hold_url),
            ("call_connect_url", &self.urls.call_connect_url),
            ("on_hold_music_url", &self.urls.on_hold_music_url),
        ] {
            if url.trim().is_empty() {
                return Err(format!("{} cannot be empty", name));
            }
        }
        if let Err(e) = Url::parse(&self.urls.call_connect_url) {
            return Err(format!("call_connect_url is not a valid URL: {}", e));
        }

        if self.storage.backend == StorageBackend::Sqlite && self.storage.database_url.is_empty() {
            return Err("database_url is required for the sqlite backend".to_string());
        }

        let tables = [
            &self.storage.inbound_table,
            &self.storage.hold_table,
            &self.storage.live_table,
        ];
        for table in tables {
            let valid = !table.is_empty()
                && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !table.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                return Err(format!("invalid table name: {:?}", table));
            }
        }
        if tables[0] == tables[1] || tables[1] == tables[2] || tables[0] == tables[2] {
            return Err("queue and pool tables must be distinct".to_string());
        }

        Ok(())
    }
}

impl RoutingUrls {
    /// Connect URL carrying the agent username and the call to bridge
    ///
    /// Both values are percent-encoded into the query, after any query the base
    /// URL already carries.
    pub fn connect_url_for(&self, username: &str, call_id: &str) -> Result<String> {
        let mut url = Url::parse(&self.call_connect_url).map_err(|e| {
            CallCenterError::configuration(format!(
                "Invalid call_connect_url {:?}: {}",
                self.call_connect_url, e
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("call", call_id);
        Ok(url.into())
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            greeting: GreetingSpec::Text(
                "Thank you for calling. An agent will be with you shortly.".to_string(),
            ),
            record_recents: true,
        }
    }
}

impl Default for RoutingUrls {
    fn default() -> Self {
        Self {
            hold_url: "http://localhost:3000/call/hold_procedure".to_string(),
            call_connect_url: "http://localhost:3000/call/connect".to_string(),
            on_hold_music_url: DEFAULT_HOLD_MUSIC_URL.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: String::new(),
            inbound_table: "inbound_calls".to_string(),
            hold_table: "held_calls".to_string(),
            live_table: "live_calls".to_string(),
        }
    }
}
