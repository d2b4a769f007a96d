use std::sync::Arc;

use dashmap::DashSet;
use tracing::debug;

use crate::activity::{CallEventLog, RecentsStore};
use crate::call::CallRecord;
use crate::config::CallCenterConfig;
use crate::directory::AgentDirectory;
use crate::error::{CallCenterError, Result};
use crate::gateway::PhoneGateway;
use crate::pool::LiveCallPool;
use crate::queue::{CallQueue, CallSubscriptions, QueueKind};
use crate::sync::ClientSyncController;

/// Central coordinator of the call center
///
/// Owns the inbound queue, the hold queue and the live call pool, and drives them
/// in response to platform events and agent requests. Construct it through
/// [`CallCenterEngineBuilder`](crate::builder::CallCenterEngineBuilder).
pub struct CallCenterEngine {
    pub(super) config: CallCenterConfig,
    pub(super) inbound_queue: Arc<CallQueue>,
    pub(super) hold_queue: Arc<CallQueue>,
    pub(super) live_calls: Arc<LiveCallPool>,
    pub(super) subscriptions: Arc<CallSubscriptions>,
    pub(super) gateway: Arc<dyn PhoneGateway>,
    pub(super) directory: Arc<dyn AgentDirectory>,
    pub(super) event_log: Arc<dyn CallEventLog>,
    pub(super) recents: Option<Arc<dyn RecentsStore>>,
    pub(super) sync_controllers: Vec<Arc<ClientSyncController>>,
    /// Call ids with a transfer currently being processed
    pub(super) transfers_in_flight: DashSet<String>,
}

/// Snapshot of container sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCenterStats {
    pub queued_calls: usize,
    pub held_calls: usize,
    pub live_calls: usize,
}

/// Everything the engine needs besides its configuration
pub struct EngineParts {
    pub inbound_queue: Arc<CallQueue>,
    pub hold_queue: Arc<CallQueue>,
    pub live_calls: Arc<LiveCallPool>,
    pub subscriptions: Arc<CallSubscriptions>,
    pub gateway: Arc<dyn PhoneGateway>,
    pub directory: Arc<dyn AgentDirectory>,
    pub event_log: Arc<dyn CallEventLog>,
    pub recents: Option<Arc<dyn RecentsStore>>,
    pub sync_controllers: Vec<Arc<ClientSyncController>>,
}

impl CallCenterEngine {
    /// Assembles an engine and links every sync controller to both queues
    pub fn from_parts(config: CallCenterConfig, parts: EngineParts) -> Result<Self> {
        config.validate().map_err(CallCenterError::configuration)?;
        if parts.inbound_queue.kind() != QueueKind::Inbound || parts.hold_queue.kind() != QueueKind::Hold {
            return Err(CallCenterError::configuration(
                "inbound and hold queues were swapped",
            ));
        }

        for controller in &parts.sync_controllers {
            controller.attach(&parts.inbound_queue, &parts.hold_queue);
        }

        Ok(Self {
            config,
            inbound_queue: parts.inbound_queue,
            hold_queue: parts.hold_queue,
            live_calls: parts.live_calls,
            subscriptions: parts.subscriptions,
            gateway: parts.gateway,
            directory: parts.directory,
            event_log: parts.event_log,
            recents: parts.recents,
            sync_controllers: parts.sync_controllers,
            transfers_in_flight: DashSet::new(),
        })
    }

    pub fn config(&self) -> &CallCenterConfig {
        &self.config
    }

    pub fn inbound_queue(&self) -> &Arc<CallQueue> {
        &self.inbound_queue
    }

    pub fn hold_queue(&self) -> &Arc<CallQueue> {
        &self.hold_queue
    }

    pub fn live_calls(&self) -> &Arc<LiveCallPool> {
        &self.live_calls
    }

    pub fn sync_controllers(&self) -> &[Arc<ClientSyncController>] {
        &self.sync_controllers
    }

    /// Queues currently holding `call_id`, from the subscription table
    pub fn queues_holding(&self, call_id: &str) -> Vec<QueueKind> {
        self.subscriptions.queues_for(call_id)
    }

    pub async fn get_stats(&self) -> Result<CallCenterStats> {
        Ok(CallCenterStats {
            queued_calls: self.inbound_queue.length().await?,
            held_calls: self.hold_queue.length().await?,
            live_calls: self.live_calls.len().await?,
        })
    }

    pub(super) fn publish_live_call(&self, call: &CallRecord) {
        for controller in &self.sync_controllers {
            controller.add_call(call.clone());
        }
    }

    pub(super) fn retract_live_call(&self, call_id: &str) {
        for controller in &self.sync_controllers {
            controller.remove_call(call_id);
        }
    }

    /// Marks a transfer of the conversation keyed by `call_id` as in flight until the
    /// guard is dropped
    ///
    /// Callers pass the conversation's primary `callId`, never a child leg id.
    pub(super) fn begin_transfer(&self, call_id: &str) -> Result<TransferGuard<'_>> {
        if !self.transfers_in_flight.insert(call_id.to_string()) {
            return Err(CallCenterError::TransferInProgress(call_id.to_string()));
        }
        debug!("🔒 Transfer lock taken for call {}", call_id);
        Ok(TransferGuard {
            in_flight: &self.transfers_in_flight,
            call_id: call_id.to_string(),
        })
    }
}

pub(super) struct TransferGuard<'a> {
    in_flight: &'a DashSet<String>,
    call_id: String,
}

impl Drop for TransferGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.call_id);
        debug!("🔓 Transfer lock released for call {}", self.call_id);
    }
}

impl std::fmt::Debug for CallCenterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallCenterEngine")
            .field("inbound_queue", &self.inbound_queue)
            .field("hold_queue", &self.hold_queue)
            .field("sync_controllers", &self.sync_controllers.len())
            .field("transfers_in_flight", &self.transfers_in_flight.len())
            .finish()
    }
}
