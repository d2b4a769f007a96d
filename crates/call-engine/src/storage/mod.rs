//! # Call Storage Strategies
//!
//! Storage contracts the queues and the live call pool are built on, and the two
//! backends that satisfy them:
//!
//! - [`MemoryCallStore`]: an in-process ordered list
//! - [`SqliteCallStore`]: a durable table in SQLite, one row per record
//!
//! Both backends implement [`CallQueueStrategy`] and [`LiveCallStore`] with the same
//! semantics, so the engine never needs to know which one is active. Predicates are
//! [`CallQuery`] values; the memory backend evaluates them directly while the SQLite
//! backend compiles them to `json_extract` conditions.
//!
//! Every operation touches at most one record and is applied atomically: a
//! matching record is either fully removed (or updated) or the call reports `None`.

use async_trait::async_trait;

use crate::call::{AgentRole, CallRecord};
use crate::error::Result;

pub mod memory;
pub mod query;
pub mod sqlite;

pub use memory::MemoryCallStore;
pub use query::CallQuery;
pub use sqlite::SqliteCallStore;

/// Ordered FIFO storage behind a [`CallQueue`](crate::queue::CallQueue)
#[async_trait]
pub trait CallQueueStrategy: Send + Sync {
    /// Appends to the tail. No deduplication.
    async fn enqueue(&self, record: CallRecord) -> Result<()>;

    /// Removes and returns the head, `None` when empty
    async fn dequeue(&self) -> Result<Option<CallRecord>>;

    /// Removes and returns the first record, in queue order, matching every field of `query`
    async fn remove_matching(&self, query: &CallQuery) -> Result<Option<CallRecord>>;

    /// Returns the first matching record without removing it
    async fn find_matching(&self, query: &CallQuery) -> Result<Option<CallRecord>>;

    async fn length(&self) -> Result<usize>;
}

/// Keyed, predicate-addressed storage behind the [`LiveCallPool`](crate::pool::LiveCallPool)
#[async_trait]
pub trait LiveCallStore: Send + Sync {
    async fn insert(&self, record: CallRecord) -> Result<()>;

    /// Non-destructive lookup of the first matching record
    async fn find(&self, query: &CallQuery) -> Result<Option<CallRecord>>;

    async fn remove(&self, query: &CallQuery) -> Result<Option<CallRecord>>;

    /// Sets `agent.role` in place on the first matching record and returns the updated record
    async fn update_agent_role(&self, query: &CallQuery, role: AgentRole) -> Result<Option<CallRecord>>;

    async fn count(&self) -> Result<usize>;
}
