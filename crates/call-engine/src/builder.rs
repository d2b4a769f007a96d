//! # Call Center Engine Builder
//!
//! Wires configuration, storage and collaborators into a ready
//! [`CallCenterEngine`]. The storage backend named in
//! [`StorageConfig`](crate::config::StorageConfig) is resolved here and nowhere
//! else; the engine only sees the storage contracts.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use switchboard_call_engine::prelude::*;
//!
//! # async fn example(gateway: Arc<dyn PhoneGateway>) -> Result<()> {
//! let directory = Arc::new(MemoryAgentDirectory::with_agents([
//!     AgentIdentity::new("alice").with_endpoint(Endpoint::user("alice123").as_current()),
//! ]));
//!
//! let engine = CallCenterEngineBuilder::new()
//!     .with_config(CallCenterConfig::from_env()?)
//!     .with_gateway(gateway)
//!     .with_directory(directory)
//!     .with_recents(Arc::new(MemoryRecents::new()))
//!     .build()
//!     .await?;
//!
//! println!("✅ Call center ready: {:?}", engine.get_stats().await?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::activity::{CallEventLog, RecentsStore, TracingEventLog};
use crate::config::{CallCenterConfig, StorageBackend};
use crate::directory::AgentDirectory;
use crate::error::{CallCenterError, Result};
use crate::gateway::PhoneGateway;
use crate::orchestrator::{CallCenterEngine, EngineParts};
use crate::pool::LiveCallPool;
use crate::queue::{CallQueue, CallSubscriptions, QueueKind};
use crate::storage::{CallQueueStrategy, LiveCallStore, MemoryCallStore, SqliteCallStore};
use crate::sync::ClientSyncController;

/// Storage for the two queues and the pool, supplied by the embedder
pub struct CallStores {
    pub inbound: Arc<dyn CallQueueStrategy>,
    pub hold: Arc<dyn CallQueueStrategy>,
    pub live: Arc<dyn LiveCallStore>,
}

/// Builder for [`CallCenterEngine`] with fluent API
#[derive(Default)]
pub struct CallCenterEngineBuilder {
    config: Option<CallCenterConfig>,
    gateway: Option<Arc<dyn PhoneGateway>>,
    directory: Option<Arc<dyn AgentDirectory>>,
    event_log: Option<Arc<dyn CallEventLog>>,
    recents: Option<Arc<dyn RecentsStore>>,
    sync_controllers: Vec<Arc<ClientSyncController>>,
    stores: Option<CallStores>,
}

impl CallCenterEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to [`CallCenterConfig::default`] when not set
    pub fn with_config(mut self, config: CallCenterConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PhoneGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn AgentDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Defaults to [`TracingEventLog`]
    pub fn with_event_log(mut self, event_log: Arc<dyn CallEventLog>) -> Self {
        self.event_log = Some(event_log);
        self
    }

    pub fn with_recents(mut self, recents: Arc<dyn RecentsStore>) -> Self {
        self.recents = Some(recents);
        self
    }

    /// Adds a controller; it is attached to both queues when the engine is built
    pub fn with_sync_controller(mut self, controller: Arc<ClientSyncController>) -> Self {
        self.sync_controllers.push(controller);
        self
    }

    /// Bypasses the configured storage backend
    pub fn with_stores(mut self, stores: CallStores) -> Self {
        self.stores = Some(stores);
        self
    }

    pub async fn build(self) -> Result<Arc<CallCenterEngine>> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(CallCenterError::configuration)?;

        let gateway = self
            .gateway
            .ok_or_else(|| CallCenterError::configuration("Phone gateway not provided"))?;
        let directory = self
            .directory
            .ok_or_else(|| CallCenterError::configuration("Agent directory not provided"))?;

        let stores = match self.stores {
            Some(stores) => stores,
            None => open_stores(&config).await?,
        };

        let subscriptions = Arc::new(CallSubscriptions::new());
        let parts = EngineParts {
            inbound_queue: Arc::new(CallQueue::new(
                QueueKind::Inbound,
                stores.inbound,
                Arc::clone(&subscriptions),
            )),
            hold_queue: Arc::new(CallQueue::new(
                QueueKind::Hold,
                stores.hold,
                Arc::clone(&subscriptions),
            )),
            live_calls: Arc::new(LiveCallPool::new(stores.live)),
            subscriptions,
            gateway,
            directory,
            event_log: self.event_log.unwrap_or_else(|| Arc::new(TracingEventLog)),
            recents: self.recents,
            sync_controllers: self.sync_controllers,
        };

        let engine = CallCenterEngine::from_parts(config, parts)?;
        info!("✅ Call center engine built");
        Ok(Arc::new(engine))
    }
}

async fn open_stores(config: &CallCenterConfig) -> Result<CallStores> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Memory => {
            info!("💾 Using in-memory call storage");
            Ok(CallStores {
                inbound: Arc::new(MemoryCallStore::new()),
                hold: Arc::new(MemoryCallStore::new()),
                live: Arc::new(MemoryCallStore::new()),
            })
        }
        StorageBackend::Sqlite => {
            let inbound = SqliteCallStore::connect(&storage.database_url, &storage.inbound_table).await?;
            let pool = inbound.pool().clone();
            let hold = SqliteCallStore::with_pool(pool.clone(), &storage.hold_table).await?;
            let live = SqliteCallStore::with_pool(pool, &storage.live_table).await?;
            info!("🗄️ Using SQLite call storage at {}", storage.database_url);
            Ok(CallStores {
                inbound: Arc::new(inbound),
                hold: Arc::new(hold),
                live: Arc::new(live),
            })
        }
    }
}
