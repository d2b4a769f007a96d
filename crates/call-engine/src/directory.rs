//! Agent directory lookups

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gateway::Endpoint;

/// An agent known to the call center
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl AgentIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            alias: None,
            endpoints: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Endpoint flagged as current, if any
    pub fn current_endpoint(&self) -> Option<&Endpoint> {
        self.endpoints.iter().find(|endpoint| endpoint.current)
    }

    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.username)
    }
}

#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn find(&self, username: &str) -> Result<Option<AgentIdentity>>;
}

/// Directory held in memory, keyed by username
#[derive(Debug, Default)]
pub struct MemoryAgentDirectory {
    agents: DashMap<String, AgentIdentity>,
}

impl MemoryAgentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agents(agents: impl IntoIterator<Item = AgentIdentity>) -> Self {
        let directory = Self::new();
        for agent in agents {
            directory.add(agent);
        }
        directory
    }

    /// Adds or replaces an agent
    pub fn add(&self, agent: AgentIdentity) {
        self.agents.insert(agent.username.clone(), agent);
    }

    pub fn remove(&self, username: &str) -> Option<AgentIdentity> {
        self.agents.remove(username).map(|(_, agent)| agent)
    }

    /// All agents sorted by username
    pub fn list(&self) -> Vec<AgentIdentity> {
        let mut agents: Vec<AgentIdentity> = self.agents.iter().map(|entry| entry.value().clone()).collect();
        agents.sort_by(|a, b| a.username.cmp(&b.username));
        agents
    }
}

#[async_trait]
impl AgentDirectory for MemoryAgentDirectory {
    async fn find(&self, username: &str) -> Result<Option<AgentIdentity>> {
        Ok(self.agents.get(username).map(|entry| entry.value().clone()))
    }
}
