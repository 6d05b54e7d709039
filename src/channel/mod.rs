//! Framed JSON method channel between the agent and its controller.
//!
//! The controller calls control-plane methods on us; we call
//! `showBlockerScreen` on it. Replies are matched to calls by id.

pub mod codec;
pub mod control;
pub mod message;

pub use codec::{read_frame, write_frame};
pub use control::{ControlCommand, ControlHandler, MonitorControl};
pub use message::{Message, ReplyOutcome};

use crate::error::ChannelError;
use crate::presentation::{MethodResult, PresentationChannel, ReplyCallback};
use crate::safe_lock;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct MethodChannel {
    writer: Mutex<Box<dyn Write + Send>>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, ReplyCallback>>,
}

impl MethodChannel {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn send(&self, message: &Message) -> Result<(), ChannelError> {
        let mut writer = safe_lock(&self.writer, "Channel writer");
        write_frame(&mut *writer, message)
    }

    pub fn pending_calls(&self) -> usize {
        safe_lock(&self.pending, "Pending calls").len()
    }

    /// Handle one inbound message.
    pub fn dispatch(&self, message: Message, control: &ControlHandler) -> Result<(), ChannelError> {
        match message {
            Message::Call { id, method, .. } => {
                debug!("Control call {id}: {method}");
                let outcome = control.handle(&method).into();
                self.send(&Message::Reply { id, outcome })
            }
            Message::Reply { id, outcome } => {
                let callback = safe_lock(&self.pending, "Pending calls").remove(&id);
                match callback {
                    Some(callback) => callback(outcome.into()),
                    None => warn!("Reply for unknown call {id}"),
                }
                Ok(())
            }
        }
    }

    /// Fail every call still waiting for a reply.
    pub fn close(&self) {
        let pending: Vec<_> = safe_lock(&self.pending, "Pending calls").drain().collect();
        for (id, callback) in pending {
            debug!("Call {id} abandoned, channel closed");
            callback(MethodResult::Error {
                code: "CHANNEL_CLOSED".into(),
                message: Some("controller disconnected before replying".into()),
                details: None,
            });
        }
    }

    /// Read and dispatch messages until the peer disconnects.
    pub fn serve<R: Read>(&self, reader: &mut R, control: &ControlHandler) -> Result<(), ChannelError> {
        let result = loop {
            let message = match read_frame::<_, Message>(reader) {
                Ok(message) => message,
                Err(e) if e.is_eof() => break Ok(()),
                Err(ChannelError::Json(e)) => {
                    warn!("Skipping malformed message: {e}");
                    continue;
                }
                Err(e) => break Err(e),
            };

            if let Err(e) = self.dispatch(message, control) {
                break Err(e);
            }
        };

        self.close();
        result
    }
}

impl PresentationChannel for MethodChannel {
    fn invoke(&self, method: &str, argument: Value, on_reply: ReplyCallback) -> Result<(), ChannelError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        safe_lock(&self.pending, "Pending calls").insert(id, on_reply);

        let sent = self.send(&Message::Call {
            id,
            method: method.to_string(),
            argument,
        });

        if sent.is_err() {
            // The caller reports the send failure; drop the callback unanswered.
            safe_lock(&self.pending, "Pending calls").remove(&id);
        }
        sent
    }
}
