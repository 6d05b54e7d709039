use crate::constants::METHOD_SHOW_BLOCKER_SCREEN;
use crate::error::{ChannelError, InterceptError};
use log::warn;
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Outcome of a call into the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    Success(Value),
    Error {
        code: String,
        message: Option<String>,
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResult {
    /// Map a reply from `showBlockerScreen` onto the interception error taxonomy.
    pub fn into_delivery(self) -> Result<(), InterceptError> {
        match self {
            MethodResult::Success(_) => Ok(()),
            MethodResult::Error { code, message, .. } => {
                Err(InterceptError::invocation_failed(code, message))
            }
            MethodResult::NotImplemented => Err(InterceptError::invocation_failed(
                "NOT_IMPLEMENTED",
                Some(format!("{METHOD_SHOW_BLOCKER_SCREEN} is not implemented")),
            )),
        }
    }
}

pub type ReplyCallback = Box<dyn FnOnce(MethodResult) + Send + 'static>;

/// A named-method channel to whatever renders the blocking UI.
///
/// `invoke` returns once the call is sent; the reply arrives later through
/// `on_reply`, possibly on another thread.
pub trait PresentationChannel: Send + Sync {
    fn invoke(&self, method: &str, argument: Value, on_reply: ReplyCallback)
        -> Result<(), ChannelError>;
}

/// Single-slot handle to the presentation channel.
///
/// Empty until the initialisation step connects it; readers must treat an
/// empty slot as "not reachable yet".
#[derive(Default)]
pub struct PresentationSlot {
    channel: RwLock<Option<Arc<dyn PresentationChannel>>>,
}

impl PresentationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, channel: Arc<dyn PresentationChannel>) {
        let mut slot = self.channel.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.is_some() {
            warn!("Presentation channel replaced");
        }
        *slot = Some(channel);
    }

    pub fn clear(&self) {
        *self.channel.write().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    pub fn get(&self) -> Option<Arc<dyn PresentationChannel>> {
        self.channel
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn is_connected(&self) -> bool {
        self.get().is_some()
    }
}
