//! Hold placement and resumption through `transfer_call`

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use switchboard_call_engine::prelude::*;
use tokio::sync::Notify;

use common::*;

fn hold_url() -> String {
    CallCenterConfig::default().urls.hold_url
}

fn connect_url(username: &str, call_id: &str) -> String {
    CallCenterConfig::default()
        .urls
        .connect_url_for(username, call_id)
        .expect("default connect URL parses")
}

#[tokio::test]
async fn test_transfer_validation_messages() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;

    let cases = [
        (TransferRequest::default(), "Transfer called with no parameters."),
        (
            TransferRequest {
                transfer_to: Some("alice".to_string()),
                ..TransferRequest::default()
            },
            "Could not transfer unknown call. callId required.",
        ),
        (
            TransferRequest {
                call_id: Some("abc".to_string()),
                ..TransferRequest::default()
            },
            "Could not transfer to unknown user. transferTo required.",
        ),
    ];

    for (request, expected) in cases {
        match engine.transfer_call(request).await {
            Err(CallCenterError::Validation(msg)) => assert_eq!(msg, expected),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
    assert!(center.gateway.instructions().is_empty());
}

#[tokio::test]
async fn test_transfer_to_unknown_agent_mutates_nothing() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;
    engine.dispatch_event(inbound_connected("cust-1", "leg-1")).await.unwrap();

    let err = engine
        .transfer_call(TransferRequest::new("cust-1", "mallory"))
        .await
        .unwrap_err();
    assert!(matches!(err, CallCenterError::UnknownAgent(ref name) if name == "mallory"));
    assert_eq!(err.to_string(), "No such user: mallory");
    assert!(err.is_validation());

    assert_eq!(engine.live_calls().len().await.unwrap(), 1);
    assert_eq!(engine.hold_queue().length().await.unwrap(), 0);
}

#[tokio::test]
async fn test_place_live_call_on_hold() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;
    engine.dispatch_event(inbound_connected("cust-1", "leg-1")).await.unwrap();

    let outcome = engine
        .transfer_call(
            TransferRequest::new("cust-1", "alice")
                .from_agent("bob")
                .on_leg(Leg::Aleg),
        )
        .await
        .unwrap();

    let TransferOutcome::PlacedOnHold { call, .. } = outcome else {
        panic!("expected the call to be placed on hold");
    };
    assert_eq!(call.on_hold_for.as_deref(), Some("alice"));
    assert_eq!(call.leg, Some(Leg::Aleg));

    assert_eq!(engine.hold_queue().length().await.unwrap(), 1);
    assert_eq!(engine.live_calls().len().await.unwrap(), 0);
    assert_eq!(engine.queues_holding("cust-1"), vec![QueueKind::Hold]);
    assert_eq!(
        center.gateway.last(),
        Some(Instruction::Redirect {
            call_id: "cust-1".to_string(),
            leg: Some(Leg::Aleg),
            url: hold_url(),
        })
    );

    let state = center.sync.state();
    assert_eq!(state.hold_list("alice").unwrap().calls, vec!["cust-1".to_string()]);
    assert!(state.calls.is_empty());
}

#[tokio::test]
async fn test_place_on_hold_by_child_leg() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;
    engine
        .dispatch_event(outbound_connected("agent-leg", "customer-leg", "alice"))
        .await
        .unwrap();

    engine
        .transfer_call(TransferRequest::new("customer-leg", "alice").on_leg(Leg::Bleg))
        .await
        .unwrap();

    let held = engine.hold_queue().remove(&CallQuery::by_call_id("agent-leg")).await.unwrap();
    assert_eq!(held.unwrap().child_call_id.as_deref(), Some("customer-leg"));
}

#[tokio::test]
async fn test_place_on_hold_requires_live_call() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;

    for _ in 0..2 {
        let err = engine
            .transfer_call(TransferRequest::new("ghost", "alice"))
            .await
            .unwrap_err();
        // A failed transfer releases its lock, so the retry sees the same error
        assert!(matches!(err, CallCenterError::NotFound(_)), "{:?}", err);
    }
    assert_eq!(engine.hold_queue().length().await.unwrap(), 0);
    assert!(center.gateway.instructions().is_empty());
}

#[tokio::test]
async fn test_resume_returns_call_to_holding_agent() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;
    engine.dispatch_event(inbound_connected("cust-1", "leg-1")).await.unwrap();
    engine
        .transfer_call(TransferRequest::new("cust-1", "alice").on_leg(Leg::Aleg))
        .await
        .unwrap();

    // bob picks the call up from alice's hold list; it still resumes for alice
    let outcome = engine
        .transfer_call(TransferRequest::new("cust-1", "bob"))
        .await
        .unwrap();
    let TransferOutcome::Resumed { call, .. } = outcome else {
        panic!("expected the held call to resume");
    };
    assert_eq!(call.call_id, "cust-1");
    assert_eq!(call.on_hold_for, None);

    assert_eq!(engine.hold_queue().length().await.unwrap(), 0);
    let live = engine
        .live_calls()
        .find(&CallQuery::by_call_id("cust-1"))
        .await
        .unwrap()
        .expect("call back in the pool");
    assert_eq!(live.on_hold_for, None);
    assert_eq!(
        center.gateway.last(),
        Some(Instruction::Redirect {
            call_id: "cust-1".to_string(),
            leg: Some(Leg::Aleg),
            url: connect_url("alice", "cust-1"),
        })
    );

    let state = center.sync.state();
    assert!(state.hold_list("alice").unwrap().calls.is_empty());
    assert_eq!(state.calls.len(), 1);
}

#[tokio::test]
async fn test_resume_agent_placed_call_swaps_to_customer_leg() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;
    engine
        .dispatch_event(outbound_connected("agent-leg", "customer-leg", "alice"))
        .await
        .unwrap();
    engine
        .transfer_call(TransferRequest::new("agent-leg", "alice").on_leg(Leg::Bleg))
        .await
        .unwrap();

    let outcome = engine
        .transfer_call(TransferRequest::new("agent-leg", "bob"))
        .await
        .unwrap();
    let TransferOutcome::Resumed { call, .. } = outcome else {
        panic!("expected the held call to resume");
    };
    assert_eq!(call.call_id, "customer-leg");
    assert_eq!(call.leg, Some(Leg::Aleg));
    assert_eq!(call.agent.role, AgentRole::Callee);
    assert_eq!(
        center.gateway.last(),
        Some(Instruction::Redirect {
            call_id: "customer-leg".to_string(),
            leg: Some(Leg::Aleg),
            url: connect_url("alice", "customer-leg"),
        })
    );

    let pooled = engine
        .live_calls()
        .find(&CallQuery::by_call_id("agent-leg"))
        .await
        .unwrap()
        .expect("pool keeps the original record");
    assert_eq!(pooled.agent.role, AgentRole::Callee);
    assert_eq!(pooled.child_call_id.as_deref(), Some("customer-leg"));
}

#[tokio::test]
async fn test_resume_by_child_leg_keeps_roles() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;
    engine
        .dispatch_event(outbound_connected("agent-leg", "customer-leg", "alice"))
        .await
        .unwrap();
    engine
        .transfer_call(TransferRequest::new("agent-leg", "alice").on_leg(Leg::Bleg))
        .await
        .unwrap();

    let outcome = engine
        .transfer_call(TransferRequest::new("customer-leg", "alice"))
        .await
        .unwrap();
    let TransferOutcome::Resumed { call, .. } = outcome else {
        panic!("expected the held call to resume");
    };
    assert_eq!(call.call_id, "agent-leg");
    assert_eq!(call.leg, Some(Leg::Bleg));
    assert_eq!(call.agent.role, AgentRole::Caller);

    let pooled = engine
        .live_calls()
        .find_by_leg("customer-leg")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pooled.agent.role, AgentRole::Caller);
}

#[tokio::test]
async fn test_hold_lists_track_each_agent() {
    let center = create_test_call_center().await.unwrap();
    let engine = &center.engine;
    for id in ["c1", "c2", "c3"] {
        engine
            .dispatch_event(inbound_connected(id, &format!("{}-leg", id)))
            .await
            .unwrap();
    }

    engine.transfer_call(TransferRequest::new("c1", "alice")).await.unwrap();
    engine.transfer_call(TransferRequest::new("c2", "alice")).await.unwrap();
    engine.transfer_call(TransferRequest::new("c3", "bob")).await.unwrap();

    let state = center.sync.state();
    assert_eq!(state.hold_list("alice").unwrap().calls, vec!["c1", "c2"]);
    assert_eq!(state.hold_list("bob").unwrap().calls, vec!["c3"]);

    engine.transfer_call(TransferRequest::new("c1", "alice")).await.unwrap();
    let state = center.sync.state();
    assert_eq!(state.hold_list("alice").unwrap().calls, vec!["c2"]);
    assert_eq!(engine.hold_queue().length().await.unwrap(), 2);
}

/// Gateway whose redirects wait until the test releases them
struct GatedGateway {
    inner: RecordingGateway,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl PhoneGateway for GatedGateway {
    fn normalize_event(&self, raw: &Value) -> Result<NormalizedEvent> {
        self.inner.normalize_event(raw)
    }

    async fn greet_caller(&self, event: &NormalizedEvent, greeting: &GreetingSpec) -> Result<GatewayResponse> {
        self.inner.greet_caller(event, greeting).await
    }

    async fn dial_endpoint(&self, endpoint: &Endpoint, call_id: &str) -> Result<GatewayResponse> {
        self.inner.dial_endpoint(endpoint, call_id).await
    }

    async fn connect_to_endpoint(&self, call: &CallRecord, agent: &str) -> Result<GatewayResponse> {
        self.inner.connect_to_endpoint(call, agent).await
    }

    async fn redirect_call(&self, call: &CallRecord, target_url: &str) -> Result<GatewayResponse> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.redirect_call(call, target_url).await
    }

    async fn put_on_hold(&self, music_url: &str) -> Result<GatewayResponse> {
        self.inner.put_on_hold(music_url).await
    }
}

#[tokio::test]
async fn test_concurrent_transfer_of_same_call_is_rejected() {
    init_tracing();
    let gateway = Arc::new(GatedGateway {
        inner: RecordingGateway::default(),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let engine = CallCenterEngineBuilder::new()
        .with_gateway(gateway.clone())
        .with_directory(Arc::new(MemoryAgentDirectory::with_agents(agents())))
        .build()
        .await
        .unwrap();
    engine.dispatch_event(inbound_connected("cust-1", "leg-1")).await.unwrap();

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.transfer_call(TransferRequest::new("cust-1", "alice")).await }
    });
    gateway.entered.notified().await;

    let err = engine
        .transfer_call(TransferRequest::new("cust-1", "bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, CallCenterError::TransferInProgress(ref id) if id == "cust-1"));

    gateway.release.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, TransferOutcome::PlacedOnHold { .. }));

    // The lock is gone once the first transfer finished
    let resume = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.transfer_call(TransferRequest::new("cust-1", "bob")).await }
    });
    gateway.entered.notified().await;
    gateway.release.notify_one();
    assert!(matches!(
        resume.await.unwrap().unwrap(),
        TransferOutcome::Resumed { .. }
    ));
    assert_eq!(gateway.inner.instructions().len(), 2);
}

#[tokio::test]
async fn test_concurrent_transfer_through_other_leg_is_rejected() {
    init_tracing();
    let gateway = Arc::new(GatedGateway {
        inner: RecordingGateway::default(),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let engine = CallCenterEngineBuilder::new()
        .with_gateway(gateway.clone())
        .with_directory(Arc::new(MemoryAgentDirectory::with_agents(agents())))
        .build()
        .await
        .unwrap();
    engine
        .dispatch_event(outbound_connected("agent-leg", "customer-leg", "alice"))
        .await
        .unwrap();

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move {
            engine
                .transfer_call(TransferRequest::new("agent-leg", "alice").on_leg(Leg::Bleg))
                .await
        }
    });
    gateway.entered.notified().await;

    // Same conversation addressed through the customer leg
    let err = engine
        .transfer_call(TransferRequest::new("customer-leg", "bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, CallCenterError::TransferInProgress(ref id) if id == "agent-leg"));
    assert_eq!(engine.hold_queue().length().await.unwrap(), 1);

    gateway.release.notify_one();
    assert!(matches!(
        first.await.unwrap().unwrap(),
        TransferOutcome::PlacedOnHold { .. }
    ));
    assert_eq!(engine.hold_queue().length().await.unwrap(), 1);
    assert_eq!(gateway.inner.instructions().len(), 1);
}
