//! # Telephony Platform Gateway
//!
//! The engine never speaks a vendor protocol. A [`PhoneGateway`] implementation
//! decodes vendor webhooks into [`NormalizedEvent`]s and encodes routing decisions
//! (greet, dial, connect, redirect, hold music) into vendor documents or API calls.
//! Whatever it produces is handed back to the caller as an opaque
//! [`GatewayResponse`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::call::{CallRecord, NormalizedEvent};
use crate::error::Result;

/// Opaque instruction produced by the gateway, usually an XML document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub content_type: String,
    pub body: String,
}

impl GatewayResponse {
    pub fn new(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn xml(body: impl Into<String>) -> Self {
        Self::new("text/xml", body)
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }
}

/// What the caller hears before an agent picks up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum GreetingSpec {
    /// Text spoken by the platform's speech synthesis
    Text(String),
    /// Audio file played to the caller
    Url(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// A PSTN number
    Number,
    /// A platform user, e.g. a SIP endpoint
    User,
}

/// A dialable destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    pub value: String,
    /// Marks the endpoint the agent is currently reachable on
    #[serde(default)]
    pub current: bool,
}

impl Endpoint {
    pub fn number(value: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Number,
            value: value.into(),
            current: false,
        }
    }

    pub fn user(value: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::User,
            value: value.into(),
            current: false,
        }
    }

    pub fn as_current(mut self) -> Self {
        self.current = true;
        self
    }
}

/// Contract for the vendor-specific telephony adapter
#[async_trait]
pub trait PhoneGateway: Send + Sync {
    /// Decodes a raw platform webhook body
    fn normalize_event(&self, raw: &Value) -> Result<NormalizedEvent>;

    /// Answers an incoming call with a greeting and waiting music
    async fn greet_caller(&self, event: &NormalizedEvent, greeting: &GreetingSpec) -> Result<GatewayResponse>;

    /// Instructs the platform to dial `endpoint`, tagging the dial with `call_id`
    async fn dial_endpoint(&self, endpoint: &Endpoint, call_id: &str) -> Result<GatewayResponse>;

    /// Connects `call` to the named agent
    async fn connect_to_endpoint(&self, call: &CallRecord, agent: &str) -> Result<GatewayResponse>;

    /// Moves the leg addressed by `call` (see [`CallRecord::leg`]) to `target_url`
    async fn redirect_call(&self, call: &CallRecord, target_url: &str) -> Result<GatewayResponse>;

    /// Document that plays looping hold music
    async fn put_on_hold(&self, music_url: &str) -> Result<GatewayResponse>;
}
