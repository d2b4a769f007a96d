//! # Switchboard Call Engine
//!
//! Call queueing and transfer engine for a browser-based call center.
//!
//! This crate provides:
//! - An inbound queue of callers waiting for any agent
//! - A hold queue of calls parked mid-conversation for a specific agent
//! - A live call pool of calls currently bridged to agents
//! - Hold/resume transfers that keep multi-leg calls addressed correctly
//! - Hangup resolution across all three containers
//! - Client state fan-out (call counts, live calls, per-agent hold lists)
//! - In-memory and SQLite storage behind one set of storage contracts
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        PhoneGateway (vendor webhooks / documents)     │
//! ├──────────────────────────────────────────────────────┤
//! │                  CallCenterEngine                     │
//! │   events │ calls │ transfer │ hangup resolution       │
//! ├──────────────────────────────────────────────────────┤
//! │  inbound CallQueue │ hold CallQueue │ LiveCallPool    │──▶ ClientSyncController
//! ├──────────────────────────────────────────────────────┤
//! │      MemoryCallStore │ SqliteCallStore (sqlx)         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Platform specifics stay behind [`PhoneGateway`](gateway::PhoneGateway) and agent
//! lookup behind [`AgentDirectory`](directory::AgentDirectory); the engine itself
//! never names a vendor.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use switchboard_call_engine::prelude::*;
//!
//! # async fn example(gateway: Arc<dyn PhoneGateway>) -> Result<()> {
//! let engine = CallCenterEngineBuilder::new()
//!     .with_gateway(gateway)
//!     .with_directory(Arc::new(MemoryAgentDirectory::new()))
//!     .build()
//!     .await?;
//!
//! let outcome = engine.handle_call_event(&json!({"CallUUID": "abc"})).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod builder;
pub mod call;
pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod pool;
pub mod queue;
pub mod storage;
pub mod sync;

pub use error::{CallCenterError, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::activity::{CallEventLog, MemoryRecents, NoopEventLog, RecentsStore, TracingEventLog};
    pub use crate::builder::{CallCenterEngineBuilder, CallStores};
    pub use crate::call::{AgentRole, CallAgent, CallEventType, CallRecord, Leg, NormalizedEvent};
    pub use crate::config::{CallCenterConfig, StorageBackend};
    pub use crate::directory::{AgentDirectory, AgentIdentity, MemoryAgentDirectory};
    pub use crate::error::{CallCenterError, Result};
    pub use crate::gateway::{Endpoint, EndpointKind, GatewayResponse, GreetingSpec, PhoneGateway};
    pub use crate::orchestrator::{
        CallCenterEngine, CallCenterStats, CallEventOutcome, CallRequest, TransferOutcome,
        TransferRequest,
    };
    pub use crate::pool::LiveCallPool;
    pub use crate::queue::{CallQueue, QueueEvent, QueueEventKind, QueueKind, QueueState};
    pub use crate::storage::{CallQuery, MemoryCallStore, SqliteCallStore};
    pub use crate::sync::{ClientSyncController, SyncAdapter, SyncClient, SyncState};
}
