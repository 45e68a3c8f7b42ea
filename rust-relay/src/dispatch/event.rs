//! Push webhook fields and the outbound dispatch body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only ref that triggers a dispatch.
pub const MAIN_REF: &str = "refs/heads/main";

const UNKNOWN_PUSHER: &str = "Unknown user";
const NO_COMMIT_MESSAGE: &str = "No commit message";

/// The parts of a GitHub push event the relay cares about.
///
/// Fields of the wrong JSON type are treated the same as missing ones, so a
/// ping or any other event shape simply fails the main-branch check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub reference: Option<String>,
    pub pusher: String,
    pub commit_message: String,
}

impl PushEvent {
    /// Parse a webhook body. Only fails if the body is not JSON at all.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let string_at = |pointer: &str| {
            value
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        PushEvent {
            reference: string_at("/ref"),
            pusher: string_at("/pusher/name").unwrap_or_else(|| UNKNOWN_PUSHER.to_string()),
            commit_message: string_at("/head_commit/message")
                .unwrap_or_else(|| NO_COMMIT_MESSAGE.to_string()),
        }
    }

    pub fn is_main_branch(&self) -> bool {
        self.reference.as_deref() == Some(MAIN_REF)
    }

    /// Human-readable summary carried in the dispatch payload.
    pub fn dispatch_message(&self) -> String {
        format!("Pushed by {}: {}", self.pusher, self.commit_message)
    }
}

/// Body of a `POST /repos/{owner}/{repo}/dispatches` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPayload {
    pub event_type: String,
    pub client_payload: ClientPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPayload {
    pub passed: bool,
    pub message: String,
}

impl DispatchPayload {
    /// Build the payload announcing a successful push.
    pub fn for_push(event_type: &str, event: &PushEvent) -> Self {
        Self {
            event_type: event_type.to_string(),
            client_payload: ClientPayload {
                passed: true,
                message: event.dispatch_message(),
            },
        }
    }
}
