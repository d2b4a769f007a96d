//! Engine-owned record of which queue each call currently sits in

use dashmap::DashMap;
use tracing::debug;

use super::QueueKind;

/// Subscription table keyed by `callId`
///
/// A queue subscribes to a call when the call is queued and unsubscribes when the
/// call leaves by dequeue or removal. The engine shares one table between the
/// inbound and hold queues so it can answer "where is this call?" without
/// scanning storage.
#[derive(Debug, Default)]
pub struct CallSubscriptions {
    entries: DashMap<String, Vec<QueueKind>>,
}

impl CallSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, call_id: &str, queue: QueueKind) {
        debug!("🔔 {} queue subscribed to call {}", queue, call_id);
        self.entries.entry(call_id.to_string()).or_default().push(queue);
    }

    /// Drops one subscription of `queue` to `call_id`; returns false if there was none
    pub fn unsubscribe(&self, call_id: &str, queue: QueueKind) -> bool {
        let mut removed = false;
        if let Some(mut queues) = self.entries.get_mut(call_id) {
            if let Some(position) = queues.iter().position(|q| *q == queue) {
                queues.remove(position);
                removed = true;
            }
        }
        self.entries.remove_if(call_id, |_, queues| queues.is_empty());
        if removed {
            debug!("🔕 {} queue unsubscribed from call {}", queue, call_id);
        }
        removed
    }

    pub fn queues_for(&self, call_id: &str) -> Vec<QueueKind> {
        self.entries
            .get(call_id)
            .map(|queues| queues.value().clone())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, call_id: &str, queue: QueueKind) -> bool {
        self.entries
            .get(call_id)
            .map(|queues| queues.contains(&queue))
            .unwrap_or(false)
    }

    /// Number of calls with at least one subscription
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let table = CallSubscriptions::new();
        table.subscribe("1", QueueKind::Inbound);
        assert!(table.is_subscribed("1", QueueKind::Inbound));
        assert!(!table.is_subscribed("1", QueueKind::Hold));

        assert!(table.unsubscribe("1", QueueKind::Inbound));
        assert!(table.queues_for("1").is_empty());
        assert_eq!(table.len(), 0);
        assert!(!table.unsubscribe("1", QueueKind::Inbound));
    }
}
