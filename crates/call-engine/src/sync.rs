//! # Client State Sync
//!
//! [`ClientSyncController`] keeps an aggregate view of the call center (connected
//! clients, live calls, inbound call count, per-agent hold lists) and pushes the
//! whole view through a [`SyncAdapter`] after every change. It learns about queue
//! changes by observing the inbound and hold [`CallQueue`]s.
//!
//! ```text
//!   inbound queue ──callCount──┐
//!                              ├──▶ ClientSyncController ──broadcast──▶ clients
//!   hold queue ──queue events──┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::call::CallRecord;
use crate::error::Result;
use crate::queue::{CallQueue, QueueEvent, QueueEventKind};

/// A connected agent client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncClient {
    pub id: Uuid,
    pub username: String,
}

impl SyncClient {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
        }
    }
}

/// Held call ids waiting for one agent, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldList {
    pub on_hold_for: String,
    pub calls: Vec<String>,
}

/// Full state pushed to clients on every change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub clients: Vec<SyncClient>,
    pub calls: Vec<CallRecord>,
    pub call_count: usize,
    pub calls_on_hold: Vec<HoldList>,
}

impl SyncState {
    pub fn hold_list(&self, username: &str) -> Option<&HoldList> {
        self.calls_on_hold.iter().find(|list| list.on_hold_for == username)
    }
}

/// Real-time transport towards clients
///
/// Delivery failures are logged by the controller and otherwise ignored.
pub trait SyncAdapter: Send + Sync {
    fn broadcast(&self, state: &SyncState) -> Result<()>;
}

/// Mirror of the client roster and live call list, e.g. for a restart
pub trait SyncPersister: Send + Sync {
    fn add_client(&self, client: &SyncClient);
    fn remove_client(&self, client: &SyncClient);
    fn add_call(&self, call: &CallRecord);
    fn remove_call(&self, call_id: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSyncPersister;

impl SyncPersister for NoopSyncPersister {
    fn add_client(&self, _client: &SyncClient) {}
    fn remove_client(&self, _client: &SyncClient) {}
    fn add_call(&self, _call: &CallRecord) {}
    fn remove_call(&self, _call_id: &str) {}
}

pub struct ClientSyncController {
    adapter: Arc<dyn SyncAdapter>,
    persister: Arc<dyn SyncPersister>,
    state: Mutex<SyncState>,
}

impl ClientSyncController {
    pub fn new(adapter: Arc<dyn SyncAdapter>, persister: Arc<dyn SyncPersister>) -> Self {
        Self {
            adapter,
            persister,
            state: Mutex::new(SyncState::default()),
        }
    }

    pub fn without_persistence(adapter: Arc<dyn SyncAdapter>) -> Self {
        Self::new(adapter, Arc::new(NoopSyncPersister))
    }

    /// Subscribes to the inbound queue's call count and the hold queue's events
    pub fn attach(self: &Arc<Self>, inbound: &CallQueue, hold: &CallQueue) {
        let controller = Arc::clone(self);
        inbound.observe_state(move |state| {
            controller.update_call_count(state.call_count);
            Ok(())
        });

        let controller = Arc::clone(self);
        hold.observe_state(move |state| {
            controller.update_hold_lists(&state.latest);
            Ok(())
        });
        info!("🔌 Sync controller attached to {} and {} queues", inbound.kind(), hold.kind());
    }

    pub fn state(&self) -> SyncState {
        self.state.lock().clone()
    }

    /// Adds a client unless one with the same username is already connected
    pub fn add_client(&self, client: SyncClient) {
        {
            let mut state = self.state.lock();
            if state.clients.iter().any(|c| c.username == client.username) {
                debug!("Client {} already connected", client.username);
                return;
            }
            self.persister.add_client(&client);
            state.clients.push(client);
        }
        self.update_clients();
    }

    pub fn remove_client(&self, client: &SyncClient) {
        self.state
            .lock()
            .clients
            .retain(|existing| existing.username != client.username);
        self.persister.remove_client(client);
        self.update_clients();
    }

    pub fn add_call(&self, call: CallRecord) {
        self.persister.add_call(&call);
        self.state.lock().calls.push(call);
        self.update_clients();
    }

    pub fn remove_call(&self, call_id: &str) {
        self.state.lock().calls.retain(|existing| existing.call_id != call_id);
        self.persister.remove_call(call_id);
        self.update_clients();
    }

    pub fn update_call_count(&self, count: usize) {
        self.state.lock().call_count = count;
        self.update_clients();
    }

    /// Applies a hold queue event to the per-agent hold lists
    ///
    /// `queue` events append the call id to the target agent's list; any other
    /// event removes the first occurrence. Events without `onHoldFor` are ignored.
    pub fn update_hold_lists(&self, event: &QueueEvent) {
        let Some(call) = event.data.as_ref() else {
            return;
        };
        let Some(on_hold_for) = call.on_hold_for.as_deref() else {
            return;
        };

        {
            let mut state = self.state.lock();
            let position = state
                .calls_on_hold
                .iter()
                .position(|list| list.on_hold_for == on_hold_for);
            let index = match position {
                Some(index) => index,
                None => {
                    state.calls_on_hold.push(HoldList {
                        on_hold_for: on_hold_for.to_string(),
                        calls: Vec::new(),
                    });
                    state.calls_on_hold.len() - 1
                }
            };
            let list = &mut state.calls_on_hold[index];

            match event.kind {
                QueueEventKind::Queue => list.calls.push(call.call_id.clone()),
                _ => {
                    if let Some(at) = list.calls.iter().position(|id| *id == call.call_id) {
                        list.calls.remove(at);
                    }
                }
            }
        }

        self.update_clients();
    }

    fn update_clients(&self) {
        let snapshot = self.state();
        if let Err(e) = self.adapter.broadcast(&snapshot) {
            warn!("⚠️ State broadcast failed: {}", e);
        }
    }
}

impl std::fmt::Debug for ClientSyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSyncController")
            .field("state", &*self.state.lock())
            .finish()
    }
}
