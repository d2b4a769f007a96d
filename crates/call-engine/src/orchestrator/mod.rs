//! # Call Center Orchestration
//!
//! The orchestrator coordinates the inbound queue, the hold queue and the live call
//! pool. Every public operation of the engine lives here, split by concern:
//!
//! - **[`core`]**: the [`CallCenterEngine`] itself, its accessors and statistics
//! - **[`events`]**: platform event routing and hangup resolution
//! - **[`calls`]**: agents taking calls from the queues, endpoint dialing, recents
//! - **[`transfer`]**: placing live calls on hold and resuming held calls
//!
//! ## Call Lifecycle
//!
//! ```text
//!  incomingCall ──▶ inbound queue ──get_call──▶ agent endpoint
//!                                                    │
//!  callConnected ─────────────────────────────▶ live call pool
//!                                                    │ transfer_call
//!                                                    ▼
//!                                               hold queue ──transfer_call──▶ live call pool
//!
//!  hangup ──▶ removed from whichever container still holds the call
//! ```
//!
//! A call record is held by at most one of the three containers at a time.
//!
//! ## Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use switchboard_call_engine::prelude::*;
//!
//! # async fn example(engine: std::sync::Arc<CallCenterEngine>) -> Result<()> {
//! // The platform reports a new call; the answer is the greeting document
//! let outcome = engine.handle_call_event(&json!({"CallUUID": "abc"})).await?;
//! if let Some(greeting) = outcome.instruction() {
//!     println!("{}", greeting.as_str());
//! }
//!
//! // An agent takes the next call
//! if let Some(call) = engine.get_call(CallRequest::next_for("alice")).await? {
//!     println!("📞 alice took {}", call.call_id);
//! }
//!
//! // ...and later parks it for bob
//! engine.transfer_call(TransferRequest::new("abc", "bob").from_agent("alice")).await?;
//! # Ok(())
//! # }
//! ```

pub mod calls;
pub mod core;
pub mod events;
pub mod transfer;

pub use self::calls::CallRequest;
pub use self::core::{CallCenterEngine, CallCenterStats, EngineParts};
pub use self::events::CallEventOutcome;
pub use self::transfer::{TransferOutcome, TransferRequest};
