//! In-process ordered list backend

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{CallQuery, CallQueueStrategy, LiveCallStore};
use crate::call::{AgentRole, CallRecord};
use crate::error::Result;

/// Memory-backed store; clones share the same underlying list
#[derive(Debug, Clone, Default)]
pub struct MemoryCallStore {
    records: Arc<Mutex<VecDeque<CallRecord>>>,
}

impl MemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with records in the given order
    pub fn with_records(records: impl IntoIterator<Item = CallRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records.into_iter().collect())),
        }
    }

    /// Copy of the current contents, head first
    pub fn snapshot(&self) -> Vec<CallRecord> {
        self.records.lock().iter().cloned().collect()
    }

    fn find_first(&self, query: &CallQuery) -> Option<CallRecord> {
        self.records
            .lock()
            .iter()
            .find(|record| query.matches(record))
            .cloned()
    }

    fn take_first(&self, query: &CallQuery) -> Option<CallRecord> {
        let mut records = self.records.lock();
        let index = records.iter().position(|record| query.matches(record))?;
        records.remove(index)
    }
}

#[async_trait]
impl CallQueueStrategy for MemoryCallStore {
    async fn enqueue(&self, record: CallRecord) -> Result<()> {
        self.records.lock().push_back(record);
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<CallRecord>> {
        Ok(self.records.lock().pop_front())
    }

    async fn remove_matching(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        let removed = self.take_first(query);
        if removed.is_none() {
            debug!("No queued call matched {:?}", query.fields());
        }
        Ok(removed)
    }

    async fn find_matching(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        Ok(self.find_first(query))
    }

    async fn length(&self) -> Result<usize> {
        Ok(self.records.lock().len())
    }
}

#[async_trait]
impl LiveCallStore for MemoryCallStore {
    async fn insert(&self, record: CallRecord) -> Result<()> {
        self.records.lock().push_back(record);
        Ok(())
    }

    async fn find(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        Ok(self.find_first(query))
    }

    async fn remove(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        Ok(self.take_first(query))
    }

    async fn update_agent_role(&self, query: &CallQuery, role: AgentRole) -> Result<Option<CallRecord>> {
        let mut records = self.records.lock();
        Ok(records
            .iter_mut()
            .find(|record| query.matches(record))
            .map(|record| {
                record.agent.role = role;
                record.clone()
            }))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.lock().len())
    }
}
