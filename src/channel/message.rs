use crate::presentation::MethodResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything that travels over the channel, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Call {
        id: u64,
        method: String,
        #[serde(default)]
        argument: Value,
    },
    Reply {
        id: u64,
        outcome: ReplyOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplyOutcome {
    Success {
        #[serde(default)]
        value: Value,
    },
    Error {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
    NotImplemented,
}

impl From<ReplyOutcome> for MethodResult {
    fn from(outcome: ReplyOutcome) -> Self {
        match outcome {
            ReplyOutcome::Success { value } => MethodResult::Success(value),
            ReplyOutcome::Error {
                code,
                message,
                details,
            } => MethodResult::Error {
                code,
                message,
                details,
            },
            ReplyOutcome::NotImplemented => MethodResult::NotImplemented,
        }
    }
}

impl From<MethodResult> for ReplyOutcome {
    fn from(result: MethodResult) -> Self {
        match result {
            MethodResult::Success(value) => ReplyOutcome::Success { value },
            MethodResult::Error {
                code,
                message,
                details,
            } => ReplyOutcome::Error {
                code,
                message,
                details,
            },
            MethodResult::NotImplemented => ReplyOutcome::NotImplemented,
        }
    }
}
