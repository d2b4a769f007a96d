//! # Call Queues
//!
//! Observable FIFO queues wrapping a [`CallQueueStrategy`](crate::storage::CallQueueStrategy).
//! Two instances exist per call center:
//!
//! - the **inbound queue**, holding calls waiting for any agent
//! - the **hold queue**, holding calls parked mid-conversation for a specific agent
//!
//! Every successful mutation (and every dequeue, even an empty one) is followed by
//! exactly one notification to each registered observer carrying the post-mutation
//! call count and the triggering [`QueueEvent`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::call::CallRecord;

pub mod call_queue;
pub mod subscriptions;

pub use call_queue::{CallQueue, StateObserver};
pub use subscriptions::CallSubscriptions;

/// Which of the two engine queues an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    Inbound,
    Hold,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Inbound => f.write_str("inbound"),
            QueueKind::Hold => f.write_str("hold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueEventKind {
    Queue,
    Dequeue,
    Remove,
}

/// The mutation that triggered an observer notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "type")]
    pub kind: QueueEventKind,
    /// Affected record; `None` only for a dequeue from an empty queue
    pub data: Option<CallRecord>,
}

/// Payload delivered to queue observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    pub call_count: usize,
    pub latest: QueueEvent,
}
