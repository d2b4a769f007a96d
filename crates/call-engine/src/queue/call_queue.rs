use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use super::{CallSubscriptions, QueueEvent, QueueEventKind, QueueKind, QueueState};
use crate::call::CallRecord;
use crate::error::Result;
use crate::storage::{CallQuery, CallQueueStrategy, MemoryCallStore};

/// Observer callback registered through [`CallQueue::observe_state`]
pub type StateObserver = Arc<dyn Fn(&QueueState) -> Result<()> + Send + Sync>;

/// Observable call queue over a pluggable storage strategy
///
/// # Examples
///
/// ```
/// use switchboard_call_engine::call::CallRecord;
/// use switchboard_call_engine::queue::{CallQueue, QueueKind};
///
/// # async fn example() -> switchboard_call_engine::Result<()> {
/// let queue = CallQueue::in_memory(QueueKind::Inbound);
/// queue.observe_state(|state| {
///     println!("{} calls waiting", state.call_count);
///     Ok(())
/// });
///
/// queue.queue(CallRecord::incoming("a")).await?;
/// queue.queue(CallRecord::incoming("b")).await?;
/// assert_eq!(queue.dequeue().await?.map(|c| c.call_id), Some("a".to_string()));
/// assert_eq!(queue.length().await?, 1);
/// # Ok(())
/// # }
/// ```
pub struct CallQueue {
    kind: QueueKind,
    strategy: Arc<dyn CallQueueStrategy>,
    subscriptions: Arc<CallSubscriptions>,
    observers: RwLock<Vec<StateObserver>>,
}

impl CallQueue {
    pub fn new(
        kind: QueueKind,
        strategy: Arc<dyn CallQueueStrategy>,
        subscriptions: Arc<CallSubscriptions>,
    ) -> Self {
        Self {
            kind,
            strategy,
            subscriptions,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Queue over a private memory store and subscription table
    pub fn in_memory(kind: QueueKind) -> Self {
        Self::new(
            kind,
            Arc::new(MemoryCallStore::new()),
            Arc::new(CallSubscriptions::new()),
        )
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Adds the call to the tail of the queue
    pub async fn queue(&self, call: CallRecord) -> Result<()> {
        self.subscriptions.subscribe(&call.call_id, self.kind);
        if let Err(e) = self.strategy.enqueue(call.clone()).await {
            self.subscriptions.unsubscribe(&call.call_id, self.kind);
            return Err(e);
        }

        info!("📞 Queued call {} on {} queue", call.call_id, self.kind);
        self.update_observers(QueueEvent {
            kind: QueueEventKind::Queue,
            data: Some(call),
        })
        .await;
        Ok(())
    }

    /// Takes the call at the head of the queue
    ///
    /// Observers are notified even when the queue was empty.
    pub async fn dequeue(&self) -> Result<Option<CallRecord>> {
        let call = self.strategy.dequeue().await?;
        match &call {
            Some(call) => {
                self.subscriptions.unsubscribe(&call.call_id, self.kind);
                info!("📤 Dequeued call {} from {} queue", call.call_id, self.kind);
            }
            None => debug!("{} queue is empty, nothing to dequeue", self.kind),
        }

        self.update_observers(QueueEvent {
            kind: QueueEventKind::Dequeue,
            data: call.clone(),
        })
        .await;
        Ok(call)
    }

    /// Takes the first call matching `query`; a miss is silent
    pub async fn remove(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        let call = self.strategy.remove_matching(query).await?;
        if let Some(call) = &call {
            self.subscriptions.unsubscribe(&call.call_id, self.kind);
            info!("🗑️ Removed call {} from {} queue", call.call_id, self.kind);
            self.update_observers(QueueEvent {
                kind: QueueEventKind::Remove,
                data: Some(call.clone()),
            })
            .await;
        }
        Ok(call)
    }

    /// Looks a queued call up without removing it; observers are not notified
    pub async fn find(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        self.strategy.find_matching(query).await
    }

    pub async fn length(&self) -> Result<usize> {
        self.strategy.length().await
    }

    /// Registers an observer invoked after every mutation
    pub fn observe_state<F>(&self, observer: F)
    where
        F: Fn(&QueueState) -> Result<()> + Send + Sync + 'static,
    {
        self.observers.write().push(Arc::new(observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    async fn update_observers(&self, event: QueueEvent) {
        let call_count = match self.strategy.length().await {
            Ok(count) => count,
            Err(e) => {
                warn!("⚠️ Could not read {} queue length, observers not updated: {}", self.kind, e);
                return;
            }
        };

        let state = QueueState {
            call_count,
            latest: event,
        };
        let observers: Vec<StateObserver> = self.observers.read().clone();

        for (index, observer) in observers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| (**observer)(&state))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("⚠️ {} queue observer #{} failed: {}", self.kind, index, e),
                Err(_) => error!("💥 {} queue observer #{} panicked", self.kind, index),
            }
        }
    }
}

impl std::fmt::Debug for CallQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallQueue")
            .field("kind", &self.kind)
            .field("observers", &self.observer_count())
            .finish()
    }
}
