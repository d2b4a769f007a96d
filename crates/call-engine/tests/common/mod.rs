//! Shared fixtures for the call-engine integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use switchboard_call_engine::prelude::*;

/// Installs a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Instruction issued through the gateway, as seen by the test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Greet { call_id: String },
    Dial { endpoint: String, call_id: String },
    Connect { call_id: String, agent: String },
    Redirect { call_id: String, leg: Option<Leg>, url: String },
    Hold { music_url: String },
}

/// Gateway that understands serialized [`CallRecord`]s and records every instruction
#[derive(Debug, Default)]
pub struct RecordingGateway {
    instructions: Mutex<Vec<Instruction>>,
}

impl RecordingGateway {
    pub fn instructions(&self) -> Vec<Instruction> {
        self.instructions.lock().clone()
    }

    pub fn last(&self) -> Option<Instruction> {
        self.instructions.lock().last().cloned()
    }

    fn record(&self, instruction: Instruction) -> GatewayResponse {
        let body = format!("<Response>{:?}</Response>", instruction);
        self.instructions.lock().push(instruction);
        GatewayResponse::xml(body)
    }
}

#[async_trait]
impl PhoneGateway for RecordingGateway {
    fn normalize_event(&self, raw: &Value) -> Result<NormalizedEvent> {
        serde_json::from_value(raw.clone())
            .map_err(|e| CallCenterError::gateway(format!("Unreadable event: {}", e)))
    }

    async fn greet_caller(&self, event: &NormalizedEvent, _greeting: &GreetingSpec) -> Result<GatewayResponse> {
        Ok(self.record(Instruction::Greet {
            call_id: event.call_id.clone(),
        }))
    }

    async fn dial_endpoint(&self, endpoint: &Endpoint, call_id: &str) -> Result<GatewayResponse> {
        Ok(self.record(Instruction::Dial {
            endpoint: endpoint.value.clone(),
            call_id: call_id.to_string(),
        }))
    }

    async fn connect_to_endpoint(&self, call: &CallRecord, agent: &str) -> Result<GatewayResponse> {
        Ok(self.record(Instruction::Connect {
            call_id: call.call_id.clone(),
            agent: agent.to_string(),
        }))
    }

    async fn redirect_call(&self, call: &CallRecord, target_url: &str) -> Result<GatewayResponse> {
        Ok(self.record(Instruction::Redirect {
            call_id: call.call_id.clone(),
            leg: call.leg,
            url: target_url.to_string(),
        }))
    }

    async fn put_on_hold(&self, music_url: &str) -> Result<GatewayResponse> {
        Ok(self.record(Instruction::Hold {
            music_url: music_url.to_string(),
        }))
    }
}

/// Sync adapter keeping every broadcast state
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    states: Mutex<Vec<SyncState>>,
}

impl RecordingAdapter {
    pub fn broadcasts(&self) -> usize {
        self.states.lock().len()
    }

    pub fn latest(&self) -> Option<SyncState> {
        self.states.lock().last().cloned()
    }
}

impl SyncAdapter for RecordingAdapter {
    fn broadcast(&self, state: &SyncState) -> Result<()> {
        self.states.lock().push(state.clone());
        Ok(())
    }
}

pub struct TestCallCenter {
    pub engine: Arc<CallCenterEngine>,
    pub gateway: Arc<RecordingGateway>,
    pub directory: Arc<MemoryAgentDirectory>,
    pub adapter: Arc<RecordingAdapter>,
    pub sync: Arc<ClientSyncController>,
    pub recents: Arc<MemoryRecents>,
}

pub fn agents() -> Vec<AgentIdentity> {
    vec![
        AgentIdentity::new("alice")
            .with_alias("Alice")
            .with_endpoint(Endpoint::user("alice123").as_current()),
        AgentIdentity::new("bob").with_endpoint(Endpoint::number("+15550001111").as_current()),
        AgentIdentity::new("carol"),
    ]
}

pub async fn create_test_call_center() -> anyhow::Result<TestCallCenter> {
    create_call_center_with(CallCenterConfig::default()).await
}

pub async fn create_call_center_with(config: CallCenterConfig) -> anyhow::Result<TestCallCenter> {
    init_tracing();

    let gateway = Arc::new(RecordingGateway::default());
    let directory = Arc::new(MemoryAgentDirectory::with_agents(agents()));
    let adapter = Arc::new(RecordingAdapter::default());
    let sync = Arc::new(ClientSyncController::without_persistence(adapter.clone()));
    let recents = Arc::new(MemoryRecents::new());

    let engine = CallCenterEngineBuilder::new()
        .with_config(config)
        .with_gateway(gateway.clone())
        .with_directory(directory.clone())
        .with_recents(recents.clone())
        .with_sync_controller(sync.clone())
        .build()
        .await?;

    Ok(TestCallCenter {
        engine,
        gateway,
        directory,
        adapter,
        sync,
        recents,
    })
}

/// A customer call bridged to an agent, as reported by `callConnected`
pub fn inbound_connected(call_id: &str, child_call_id: &str) -> CallRecord {
    CallRecord::connected(call_id, child_call_id)
        .with_agent(CallAgent::callee())
        .with_parties("+15551234567", "alice")
}

/// A call an agent dialed out: `call_id` is the agent leg, `child_call_id` the customer leg
pub fn outbound_connected(call_id: &str, child_call_id: &str, agent: &str) -> CallRecord {
    CallRecord::connected(call_id, child_call_id)
        .with_agent(CallAgent::caller(agent))
        .with_parties(agent, "+15559876543")
}

pub fn raw(record: &CallRecord) -> Value {
    serde_json::to_value(record).expect("record serializes")
}
