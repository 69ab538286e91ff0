use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use callback::Event;
use crossbeam_channel::{Sender, TrySendError};

/// Thread-safe entry point for engine callbacks.
///
/// Callbacks are queued for the UI thread, never handled where they arrive. When the
/// queue is full the callback is dropped and the sink remembers it overflowed; the
/// plugin then treats every tile as invalid on its next pump.
#[derive(Debug, Clone)]
pub struct CallbackSink {
    sender: Sender<Event>,
    overflowed: Arc<AtomicBool>,
}

impl CallbackSink {
    pub(crate) fn new(sender: Sender<Event>, overflowed: Arc<AtomicBool>) -> Self {
        Self { sender, overflowed }
    }

    /// Queues one callback. Returns false when it was dropped.
    pub fn deliver(&self, code: i32, payload: Option<&[u8]>) -> bool {
        match self.sender.try_send(Event::new(code, payload)) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!("[plugin] callback queue full, dropping {}", event.name());
                self.overflowed.store(true, Ordering::Release);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn deliver_text(&self, code: i32, payload: &str) -> bool {
        self.deliver(code, Some(payload.as_bytes()))
    }
}
