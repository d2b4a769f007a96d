//! Agent-initiated call retrieval

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::core::CallCenterEngine;
use crate::call::CallRecord;
use crate::error::{CallCenterError, Result};
use crate::gateway::GatewayResponse;
use crate::storage::CallQuery;

/// An agent asking for a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Specific call to take; the head of the queue when absent
    pub call_id: Option<String>,
    /// Username of the requesting agent
    pub user: Option<String>,
}

impl CallRequest {
    pub fn next_for(user: impl Into<String>) -> Self {
        Self {
            call_id: None,
            user: Some(user.into()),
        }
    }

    pub fn call_for(call_id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            call_id: Some(call_id.into()),
            user: Some(user.into()),
        }
    }
}

impl CallCenterEngine {
    /// Takes a call from the inbound queue and connects it to the requesting agent
    ///
    /// Returns `Ok(None)` when there was no call to take.
    ///
    /// A request without `user` is rejected with a validation error before anything
    /// is dequeued, an extra check on top of the queue contract: the connect
    /// instruction has no agent to address without it.
    pub async fn get_call(&self, request: CallRequest) -> Result<Option<CallRecord>> {
        let user = request
            .user
            .ok_or_else(|| CallCenterError::validation("No user parameter provided"))?;

        let call = match &request.call_id {
            Some(call_id) => {
                let call = self.inbound_queue.remove(&CallQuery::by_call_id(call_id)).await?;
                if call.is_none() {
                    warn!("⚠️ Could not remove call {} for {}", call_id, user);
                }
                call
            }
            None => {
                let call = self.inbound_queue.dequeue().await?;
                if call.is_none() {
                    warn!("⚠️ No calls to dequeue for {}", user);
                }
                call
            }
        };

        if let Some(call) = &call {
            info!("🎧 Connecting call {} to agent {}", call.call_id, user);
            self.gateway.connect_to_endpoint(call, &user).await?;
        }
        Ok(call)
    }

    /// Takes a specific call off hold and connects it to the requesting agent
    pub async fn get_call_on_hold(&self, request: CallRequest) -> Result<Option<CallRecord>> {
        let call_id = request
            .call_id
            .ok_or_else(|| CallCenterError::validation("No call id parameter provided"))?;
        let user = request
            .user
            .ok_or_else(|| CallCenterError::validation("No user parameter provided"))?;

        info!("⏯️ Off-holding call {} to {}", call_id, user);
        let call = self.hold_queue.remove(&CallQuery::by_call_id(&call_id)).await?;

        match &call {
            Some(call) => {
                self.gateway.connect_to_endpoint(call, &user).await?;
            }
            None => error!("❌ Call {} is not on hold", call_id),
        }
        Ok(call)
    }

    /// Dial instruction bridging `call_id` to the agent's current endpoint
    pub async fn connect_call_to_endpoint(&self, username: &str, call_id: &str) -> Result<GatewayResponse> {
        let agent = self
            .directory
            .find(username)
            .await?
            .ok_or_else(|| CallCenterError::unknown_agent(username))?;
        let endpoint = agent.current_endpoint().ok_or_else(|| {
            CallCenterError::not_found(format!("No current endpoint for {}", username))
        })?;

        info!("☎️ Dialing {} ({:?}) for call {}", username, endpoint.kind, call_id);
        self.gateway.dial_endpoint(endpoint, call_id).await
    }

    /// Hold music document for calls parked on the hold queue
    pub async fn connect_call_to_on_hold(&self) -> Result<GatewayResponse> {
        let music_url = &self.config.urls.on_hold_music_url;
        if music_url.is_empty() {
            return Err(CallCenterError::configuration("No hold music URL provided"));
        }
        self.gateway.put_on_hold(music_url).await
    }

    /// Recently completed calls; empty when no recents collection is configured
    pub async fn recents(&self) -> Result<Vec<CallRecord>> {
        match &self.recents {
            Some(recents) => recents.get().await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn post_recent(&self, recent: CallRecord) -> Result<()> {
        match &self.recents {
            Some(recents) => recents.post(recent).await,
            None => Ok(()),
        }
    }
}
