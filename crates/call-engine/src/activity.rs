//! Call activity: the per-event log and the recents collection

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::call::{CallRecord, NormalizedEvent};
use crate::error::Result;

/// Best-effort sink for every normalized call event
///
/// Implementations must not fail the caller; anything that can go wrong is
/// theirs to swallow.
pub trait CallEventLog: Send + Sync {
    fn log(&self, event: &NormalizedEvent);
}

/// Used when no event log is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventLog;

impl CallEventLog for NoopEventLog {
    fn log(&self, _event: &NormalizedEvent) {}
}

/// Writes every event to the `tracing` pipeline at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl CallEventLog for TracingEventLog {
    fn log(&self, event: &NormalizedEvent) {
        debug!(
            call_id = %event.call_id,
            event_type = %event.event_type,
            role = %event.agent.role,
            "📒 call event"
        );
    }
}

/// Collection of completed calls shown as "recents" to agents
#[async_trait]
pub trait RecentsStore: Send + Sync {
    async fn get(&self) -> Result<Vec<CallRecord>>;
    async fn post(&self, recent: CallRecord) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryRecents {
    recents: Mutex<Vec<CallRecord>>,
}

impl MemoryRecents {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecentsStore for MemoryRecents {
    async fn get(&self) -> Result<Vec<CallRecord>> {
        Ok(self.recents.lock().clone())
    }

    async fn post(&self, recent: CallRecord) -> Result<()> {
        self.recents.lock().push(recent);
        Ok(())
    }
}
