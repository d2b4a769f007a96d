//! Dotted-path equality predicates over call records

use serde_json::Value;

use crate::call::{AgentRole, CallRecord};

/// A conjunction of `(dotted path, expected value)` pairs
///
/// A record matches when every named field exists and is exactly equal to the
/// expected value. An empty query matches the first record of any collection.
///
/// ```
/// use switchboard_call_engine::storage::CallQuery;
/// use switchboard_call_engine::call::{AgentRole, CallAgent, CallRecord};
///
/// let record = CallRecord::connected("p-1", "c-1").with_agent(CallAgent::caller("alice"));
///
/// assert!(CallQuery::by_child_call_id("c-1").with_role(AgentRole::Caller).matches(&record));
/// assert!(!CallQuery::by_call_id("p-1").with_role(AgentRole::Callee).matches(&record));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallQuery {
    fields: Vec<(String, Value)>,
}

impl CallQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_call_id(call_id: impl Into<String>) -> Self {
        Self::new().field("callId", call_id.into())
    }

    pub fn by_child_call_id(child_call_id: impl Into<String>) -> Self {
        Self::new().field("childCallId", child_call_id.into())
    }

    /// Adds an equality condition on a dotted path such as `agent.role`
    pub fn field(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((path.into(), value.into()));
        self
    }

    pub fn with_role(self, role: AgentRole) -> Self {
        self.field("agent.role", role)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Matches against an already-serialized record document
    pub fn matches_value(&self, document: &Value) -> bool {
        self.fields
            .iter()
            .all(|(path, expected)| lookup(document, path) == Some(expected))
    }

    pub fn matches(&self, record: &CallRecord) -> bool {
        match serde_json::to_value(record) {
            Ok(document) => self.matches_value(&document),
            Err(_) => false,
        }
    }
}

/// Walks a dotted path through nested JSON objects
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}
