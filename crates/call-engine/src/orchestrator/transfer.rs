//! # Hold and Transfer
//!
//! One conversation can span two platform call ids: the customer leg and a leg an
//! agent dialed. Transfers keep redirect instructions aimed at the right one.
//!
//! ```text
//!            transfer (no hold entry)              transfer (hold entry found)
//!   pool ───────────────────────────▶ hold queue ───────────────────────────▶ pool
//!          leg = request.leg                      caller role + own leg:
//!          onHoldFor = target                       role → callee, callId → childCallId,
//!          redirect → hold URL                      leg → aleg
//!                                                 redirect → connect URL for onHoldFor
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::core::CallCenterEngine;
use crate::call::{AgentRole, CallRecord, Leg};
use crate::directory::AgentIdentity;
use crate::error::{CallCenterError, Result};
use crate::gateway::GatewayResponse;
use crate::storage::CallQuery;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub call_id: Option<String>,
    /// Username of the agent the call is for
    pub transfer_to: Option<String>,
    /// Username of the agent handing the call over; informational
    pub transfer_from: Option<String>,
    /// Leg to redirect when placing the call on hold
    pub leg: Option<Leg>,
}

impl TransferRequest {
    pub fn new(call_id: impl Into<String>, transfer_to: impl Into<String>) -> Self {
        Self {
            call_id: Some(call_id.into()),
            transfer_to: Some(transfer_to.into()),
            ..Self::default()
        }
    }

    pub fn from_agent(mut self, username: impl Into<String>) -> Self {
        self.transfer_from = Some(username.into());
        self
    }

    pub fn on_leg(mut self, leg: Leg) -> Self {
        self.leg = Some(leg);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.call_id.is_none()
            && self.transfer_to.is_none()
            && self.transfer_from.is_none()
            && self.leg.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// The call was parked on the hold queue for `call.on_hold_for`
    PlacedOnHold {
        call: CallRecord,
        response: GatewayResponse,
    },
    /// A held call was sent back to the agent it was held for; `call` is the leg
    /// that was redirected
    Resumed {
        call: CallRecord,
        response: GatewayResponse,
    },
}

impl CallCenterEngine {
    /// Places a live call on hold for an agent, or resumes a held call
    ///
    /// A held call always resumes for the agent it was held for (`onHoldFor`);
    /// `transferTo` must still name a known agent. Validation and agent resolution
    /// happen before anything is touched, so a request that fails them leaves
    /// every container as it was.
    pub async fn transfer_call(&self, request: TransferRequest) -> Result<TransferOutcome> {
        if request.is_empty() {
            return Err(CallCenterError::validation("Transfer called with no parameters."));
        }
        let call_id = request.call_id.clone().ok_or_else(|| {
            CallCenterError::validation("Could not transfer unknown call. callId required.")
        })?;
        let transfer_to = request.transfer_to.clone().ok_or_else(|| {
            CallCenterError::validation("Could not transfer to unknown user. transferTo required.")
        })?;

        info!(
            "🔀 Transfer of call {} to {} requested by {:?}",
            call_id, transfer_to, request.transfer_from
        );

        let target = self
            .directory
            .find(&transfer_to)
            .await?
            .ok_or_else(|| CallCenterError::unknown_agent(&transfer_to))?;

        let conversation = self.conversation_id(&call_id).await?;
        let _guard = self.begin_transfer(&conversation)?;

        let held = match self.hold_queue.remove(&CallQuery::by_call_id(&call_id)).await? {
            Some(call) => Some(call),
            None => self.hold_queue.remove(&CallQuery::by_child_call_id(&call_id)).await?,
        };

        match held {
            None => self.place_on_hold(&call_id, request.leg, &target).await,
            Some(call) => self.resume_held_call(&call_id, call, &target).await,
        }
    }

    /// Primary `callId` of the conversation `call_id` belongs to, wherever it is held
    ///
    /// Both legs of one conversation resolve to the same id, so transfers addressed
    /// through either leg contend for the same lock.
    async fn conversation_id(&self, call_id: &str) -> Result<String> {
        let held = match self.hold_queue.find(&CallQuery::by_call_id(call_id)).await? {
            Some(call) => Some(call),
            None => self.hold_queue.find(&CallQuery::by_child_call_id(call_id)).await?,
        };
        let record = match held {
            Some(call) => Some(call),
            None => self.live_calls.find_by_leg(call_id).await?,
        };
        Ok(record.map_or_else(|| call_id.to_string(), |call| call.call_id))
    }

    async fn place_on_hold(
        &self,
        call_id: &str,
        leg: Option<Leg>,
        target: &AgentIdentity,
    ) -> Result<TransferOutcome> {
        let live = self
            .live_calls
            .find_by_leg(call_id)
            .await?
            .ok_or_else(|| CallCenterError::not_found(format!("No live call {}", call_id)))?;

        let mut call = self
            .live_calls
            .remove(&CallQuery::by_call_id(&live.call_id))
            .await?
            .ok_or_else(|| CallCenterError::not_found(format!("Live call {} vanished", live.call_id)))?;
        self.retract_live_call(&call.call_id);

        call.leg = leg;
        call.on_hold_for = Some(target.username.clone());
        self.hold_queue.queue(call.clone()).await?;

        info!(
            "⏸️ Call {} on hold for {} (leg {:?})",
            call.call_id, target.username, call.leg
        );
        let response = self
            .gateway
            .redirect_call(&call, &self.config.urls.hold_url)
            .await?;

        Ok(TransferOutcome::PlacedOnHold { call, response })
    }

    async fn resume_held_call(
        &self,
        requested_call_id: &str,
        mut call: CallRecord,
        target: &AgentIdentity,
    ) -> Result<TransferOutcome> {
        // The call goes back to the agent it was parked for
        let agent = match call.on_hold_for.take() {
            Some(agent) => agent,
            None => {
                warn!(
                    "⚠️ Held call {} names no agent, resuming it for {}",
                    call.call_id, target.username
                );
                target.username.clone()
            }
        };
        if agent != target.username {
            debug!(
                "Transfer of held call {} named {}, resuming for {}",
                call.call_id, target.username, agent
            );
        }

        self.live_calls.upsert(call.clone()).await?;
        self.publish_live_call(&call);

        let mut working = call.clone();
        if call.agent.role == AgentRole::Caller && requested_call_id == call.call_id {
            match call.child_call_id.clone() {
                Some(child_call_id) => {
                    self.live_calls
                        .update_agent_role(&CallQuery::by_call_id(&call.call_id), AgentRole::Callee)
                        .await?;
                    working.agent.role = AgentRole::Callee;
                    working.call_id = child_call_id;
                    working.leg = Some(Leg::Aleg);
                }
                None => warn!(
                    "⚠️ Call {} was placed by an agent but has no child leg to redirect",
                    call.call_id
                ),
            }
        }

        let target_url = self.config.urls.connect_url_for(&agent, &working.call_id)?;
        info!("▶️ Resuming call {} for {}", working.call_id, agent);
        let response = self.gateway.redirect_call(&working, &target_url).await?;

        Ok(TransferOutcome::Resumed {
            call: working,
            response,
        })
    }
}
