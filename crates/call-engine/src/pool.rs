//! # Live Call Pool
//!
//! Registry of calls currently bridged to an agent. Unlike the queues it is not
//! ordered for consumption: records are addressed by [`CallQuery`] predicates, and
//! the transfer protocol flips `agent.role` in place when control of a multi-leg
//! call passes to the customer leg.

use std::sync::Arc;

use tracing::{debug, info};

use crate::call::{AgentRole, CallRecord};
use crate::error::Result;
use crate::storage::{CallQuery, LiveCallStore, MemoryCallStore};

pub struct LiveCallPool {
    store: Arc<dyn LiveCallStore>,
}

impl LiveCallPool {
    pub fn new(store: Arc<dyn LiveCallStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCallStore::new()))
    }

    pub async fn insert(&self, call: CallRecord) -> Result<()> {
        info!("🔗 Live call {} registered", call.call_id);
        self.store.insert(call).await
    }

    /// Inserts `call`, first retiring any record already addressing the same leg
    ///
    /// A record addresses the leg when its `callId` equals the new `callId`, or when
    /// its `childCallId` does (the customer leg of a call an agent placed).
    /// Returns the replaced records.
    pub async fn upsert(&self, call: CallRecord) -> Result<Vec<CallRecord>> {
        let mut replaced = Vec::new();
        for query in [
            CallQuery::by_call_id(&call.call_id),
            CallQuery::by_child_call_id(&call.call_id),
        ] {
            while let Some(previous) = self.store.remove(&query).await? {
                debug!("Replacing live call record {}", previous.call_id);
                replaced.push(previous);
            }
        }
        self.insert(call).await?;
        Ok(replaced)
    }

    pub async fn find(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        self.store.find(query).await
    }

    /// Looks a call up by either of its leg identifiers
    pub async fn find_by_leg(&self, call_id: &str) -> Result<Option<CallRecord>> {
        match self.store.find(&CallQuery::by_call_id(call_id)).await? {
            Some(call) => Ok(Some(call)),
            None => self.store.find(&CallQuery::by_child_call_id(call_id)).await,
        }
    }

    pub async fn remove(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        let removed = self.store.remove(query).await?;
        if let Some(call) = &removed {
            info!("✂️ Live call {} retired", call.call_id);
        }
        Ok(removed)
    }

    /// Retires the record addressing `call_id`, trying `callId` before `childCallId`
    pub async fn remove_by_leg(&self, call_id: &str) -> Result<Option<CallRecord>> {
        match self.remove(&CallQuery::by_call_id(call_id)).await? {
            Some(call) => Ok(Some(call)),
            None => self.remove(&CallQuery::by_child_call_id(call_id)).await,
        }
    }

    pub async fn update_agent_role(&self, query: &CallQuery, role: AgentRole) -> Result<Option<CallRecord>> {
        let updated = self.store.update_agent_role(query, role).await?;
        match &updated {
            Some(call) => info!("🔁 Live call {} agent role set to {}", call.call_id, role),
            None => debug!("No live call matched {:?} for role update", query.fields()),
        }
        Ok(updated)
    }

    pub async fn len(&self) -> Result<usize> {
        self.store.count().await
    }
}

impl std::fmt::Debug for LiveCallPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveCallPool").finish_non_exhaustive()
    }
}
