//! Platform event routing and hangup resolution

use serde_json::Value;
use tracing::{debug, info, warn};

use super::core::CallCenterEngine;
use crate::call::{AgentRole, CallEventType, CallRecord, NormalizedEvent};
use crate::error::Result;
use crate::gateway::{Endpoint, GatewayResponse};
use crate::storage::CallQuery;

/// What the engine made of a platform event
#[derive(Debug, Clone, PartialEq)]
pub enum CallEventOutcome {
    /// Document to return to the platform
    Instruction(GatewayResponse),
    /// Hangup handled; carries the record taken out of a queue, if any
    HungUp(Option<CallRecord>),
    /// Event applied, nothing to answer
    Accepted,
    /// Event type outside the known lifecycle
    Ignored,
}

impl CallEventOutcome {
    pub fn instruction(&self) -> Option<&GatewayResponse> {
        match self {
            CallEventOutcome::Instruction(response) => Some(response),
            _ => None,
        }
    }
}

impl CallCenterEngine {
    /// Normalizes a raw platform webhook and routes it
    pub async fn handle_call_event(&self, raw: &Value) -> Result<CallEventOutcome> {
        let event = self.gateway.normalize_event(raw)?;
        self.dispatch_event(event).await
    }

    /// Routes an already-normalized event
    ///
    /// | event              | effect                               | answer               |
    /// |--------------------|--------------------------------------|----------------------|
    /// | `incomingCall`     | enqueued on the inbound queue        | greeting             |
    /// | `agentCallRequest` | none                                 | dial of `to`         |
    /// | `callConnected`    | registered in the live call pool     | none                 |
    /// | `hangup`           | hangup resolution, then recents      | removed record       |
    pub async fn dispatch_event(&self, event: NormalizedEvent) -> Result<CallEventOutcome> {
        self.event_log.log(&event);

        match event.event_type {
            CallEventType::IncomingCall => {
                info!("📞 Incoming call {} from {:?}", event.call_id, event.from);
                self.inbound_queue.queue(event.clone()).await?;
                let response = self
                    .gateway
                    .greet_caller(&event, &self.config.general.greeting)
                    .await?;
                Ok(CallEventOutcome::Instruction(response))
            }
            CallEventType::AgentCallRequest => {
                let destination = event.to.clone().unwrap_or_default();
                info!(
                    "📲 Agent {:?} dialing {} on call {}",
                    event.agent.id, destination, event.call_id
                );
                let response = self
                    .gateway
                    .dial_endpoint(&Endpoint::number(destination), &event.call_id)
                    .await?;
                Ok(CallEventOutcome::Instruction(response))
            }
            CallEventType::CallConnected => {
                info!(
                    "🔗 Call {} connected (child leg {:?})",
                    event.call_id, event.child_call_id
                );
                let replaced = self.live_calls.upsert(event.clone()).await?;
                for previous in &replaced {
                    self.retract_live_call(&previous.call_id);
                }
                self.publish_live_call(&event);
                Ok(CallEventOutcome::Accepted)
            }
            CallEventType::Hangup => {
                let removed = self.hangup_call(&event.call_id).await?;
                self.record_recent(event).await;
                Ok(CallEventOutcome::HungUp(removed))
            }
            CallEventType::Unknown => {
                warn!("❓ Unknown call event type for call {}: {:?}", event.call_id, event);
                Ok(CallEventOutcome::Ignored)
            }
        }
    }

    /// Posts a completed call to the recents collection; failures are only logged
    async fn record_recent(&self, event: NormalizedEvent) {
        if !self.config.general.record_recents {
            return;
        }
        if let Some(recents) = &self.recents {
            let call_id = event.call_id.clone();
            if let Err(e) = recents.post(event).await {
                warn!("⚠️ Could not record call {} in recents: {}", call_id, e);
            }
        }
    }

    /// Takes a hung-up call out of whichever queue still holds it
    ///
    /// Resolution order, first match wins:
    /// 1. the inbound queue by `callId` (never answered)
    /// 2. the hold queue by `callId` with role `callee` (held inbound call)
    /// 3. the hold queue by `childCallId` with role `caller` (customer leg of a
    ///    held call an agent placed)
    ///
    /// Without a match the hangup is the agent leg of a held call and nothing is
    /// removed from the queues. A live call addressed by the id is then retired
    /// from the pool; that does not change the returned value.
    pub async fn hangup_call(&self, call_id: &str) -> Result<Option<CallRecord>> {
        let mut removed = self.inbound_queue.remove(&CallQuery::by_call_id(call_id)).await?;

        if removed.is_none() {
            removed = self
                .hold_queue
                .remove(&CallQuery::by_call_id(call_id).with_role(AgentRole::Callee))
                .await?;
        }
        if removed.is_none() {
            removed = self
                .hold_queue
                .remove(&CallQuery::by_child_call_id(call_id).with_role(AgentRole::Caller))
                .await?;
        }

        match &removed {
            Some(call) => info!("📴 Hangup of {} removed queued call {}", call_id, call.call_id),
            None => {
                debug!("📴 Hangup of {} matched no queued call", call_id);
                if let Some(live) = self.live_calls.remove_by_leg(call_id).await? {
                    self.retract_live_call(&live.call_id);
                }
            }
        }

        Ok(removed)
    }
}
