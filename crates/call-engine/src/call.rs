//! # Call Records
//!
//! The call record is the single entity that flows between the inbound queue,
//! the hold queue and the live call pool. Records serialize with camelCase
//! field names (`callId`, `childCallId`, `agent.role`, `onHoldFor`, ...) and
//! those names are what [`CallQuery`](crate::storage::CallQuery) paths address.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which leg of a multi-leg call a record currently addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    /// The original, customer-facing leg
    Aleg,
    /// An agent-dialed outbound leg
    Bleg,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Leg::Aleg => "aleg",
            Leg::Bleg => "bleg",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the call was placed by an agent dialing out or arrived from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// An agent initiated the call
    Caller,
    /// The call arrived from outside the call center
    #[default]
    Callee,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Caller => "caller",
            AgentRole::Callee => "callee",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AgentRole> for serde_json::Value {
    fn from(role: AgentRole) -> Self {
        serde_json::Value::String(role.as_str().to_string())
    }
}

/// Agent side of a call record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallAgent {
    pub role: AgentRole,
    /// Agent that initiated an outbound leg; only set for [`AgentRole::Caller`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CallAgent {
    pub fn caller(agent_id: impl Into<String>) -> Self {
        Self {
            role: AgentRole::Caller,
            id: Some(agent_id.into()),
        }
    }

    pub fn callee() -> Self {
        Self::default()
    }
}

/// Normalized lifecycle event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallEventType {
    IncomingCall,
    AgentCallRequest,
    CallConnected,
    Hangup,
    /// Anything the platform sent that falls outside the known lifecycle
    Unknown,
}

impl fmt::Display for CallEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallEventType::IncomingCall => "incomingCall",
            CallEventType::AgentCallRequest => "agentCallRequest",
            CallEventType::CallConnected => "callConnected",
            CallEventType::Hangup => "hangup",
            CallEventType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A call as tracked by the engine
///
/// Created when the gateway normalizes an `incomingCall` or `agentCallRequest`
/// event and dropped from every container on `hangup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg: Option<Leg>,
    #[serde(default)]
    pub agent: CallAgent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_hold_for: Option<String>,
    #[serde(rename = "type")]
    pub event_type: CallEventType,

    // Informational only, never consulted for routing decisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Call duration in seconds, as reported by the platform on hangup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

/// What the telephony gateway produces from a raw webhook
pub type NormalizedEvent = CallRecord;

impl CallRecord {
    pub fn new(call_id: impl Into<String>, event_type: CallEventType) -> Self {
        Self {
            call_id: call_id.into(),
            child_call_id: None,
            leg: None,
            agent: CallAgent::default(),
            on_hold_for: None,
            event_type,
            platform: None,
            to: None,
            from: None,
            timestamp: Some(Utc::now()),
            answer_time: None,
            end_time: None,
            duration: None,
        }
    }

    pub fn incoming(call_id: impl Into<String>) -> Self {
        Self::new(call_id, CallEventType::IncomingCall)
    }

    pub fn connected(call_id: impl Into<String>, child_call_id: impl Into<String>) -> Self {
        Self::new(call_id, CallEventType::CallConnected).with_child_call_id(child_call_id)
    }

    pub fn hangup(call_id: impl Into<String>) -> Self {
        Self::new(call_id, CallEventType::Hangup)
    }

    pub fn with_child_call_id(mut self, child_call_id: impl Into<String>) -> Self {
        self.child_call_id = Some(child_call_id.into());
        self
    }

    pub fn with_agent(mut self, agent: CallAgent) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_leg(mut self, leg: Leg) -> Self {
        self.leg = Some(leg);
        self
    }

    pub fn with_parties(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self.to = Some(to.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// True when either leg identifier equals `call_id`
    pub fn addresses(&self, call_id: &str) -> bool {
        self.call_id == call_id || self.child_call_id.as_deref() == Some(call_id)
    }
}
