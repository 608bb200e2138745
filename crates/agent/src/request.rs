use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use forgeops_core::{RequestId, Urgency};

/// What the caller expects the agent to do with the prompt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Request,
    Query,
    Analysis,
    Validation,
}

/// A unit of work for an automated agent.
///
/// Owned by the caller until enqueued, then by the queue until dequeued; the
/// dispatcher owns it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub id: RequestId,
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Urgency>,
}

impl ConversationRequest {
    /// Create a request with a freshly generated id.
    pub fn new(prompt: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            id: RequestId::generate(),
            prompt: prompt.into(),
            kind,
            context: None,
            urgency: None,
            severity: None,
        }
    }

    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    pub fn with_severity(mut self, severity: Urgency) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_context(mut self, context: Map<String, JsonValue>) -> Self {
        self.context = Some(context);
        self
    }

    /// Priority used for dispatch: explicit urgency, else severity, else medium.
    pub fn effective_priority(&self) -> Urgency {
        self.urgency.or(self.severity).unwrap_or_default()
    }
}
